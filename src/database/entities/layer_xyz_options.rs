use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// XYZ source of a layer. `url_template` never holds the resolved URL; the token lives in
/// `access_token`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "layer_xyz_options")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub layer_id: i32,
    pub url_template: Option<String>,
    pub access_token: Option<String>,
    pub projection: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tile_size: Option<Json>,
    pub attribution_html: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extent: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tile_grid: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::layers::Entity",
        from = "Column::LayerId",
        to = "super::layers::Column::Id"
    )]
    Layers,
}

impl Related<super::layers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Layers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

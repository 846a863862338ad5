use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Service options of a wms, wfs or arcgisrest layer
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "layer_server_options")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub layer_id: i32,
    pub wms_layers: Option<String>,
    pub order_by: Option<String>,
    pub property_name: Option<String>,
    pub version: Option<String>,
    pub max_resolution: Option<f64>,
    pub feature_type: Option<String>,
    pub geom_field_name: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extras: Option<Json>,
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

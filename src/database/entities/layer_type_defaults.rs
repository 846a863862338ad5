use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "layer_type_defaults")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub portal_id: i32,
    pub layer_type: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub defaults: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portals::Entity",
        from = "Column::PortalId",
        to = "super::portals::Column::Id"
    )]
    Portals,
}

impl Related<super::portals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

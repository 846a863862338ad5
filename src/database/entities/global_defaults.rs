use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One global key of a portal's defaults block. The value is kept as JSON text so that a JSON
/// `null` is stored distinctly from an absent row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "global_defaults")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub portal_id: i32,
    pub key: String,
    pub value_json: String,
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

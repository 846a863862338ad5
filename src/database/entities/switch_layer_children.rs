use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "switch_layer_children")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_layer_id: i32,
    pub child_layer_id: i32,
    pub position: i32, // 1-based
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::layers::Entity",
        from = "Column::ParentLayerId",
        to = "super::layers::Column::Id"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "super::layers::Entity",
        from = "Column::ChildLayerId",
        to = "super::layers::Column::Id"
    )]
    Child,
}

impl ActiveModelBehavior for ActiveModel {}

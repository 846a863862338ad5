use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub title: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::global_defaults::Entity")]
    GlobalDefaults,
    #[sea_orm(has_many = "super::layer_type_defaults::Entity")]
    LayerTypeDefaults,
    #[sea_orm(has_many = "super::layers::Entity")]
    Layers,
    #[sea_orm(has_many = "super::portal_tree_nodes::Entity")]
    TreeNodes,
}

impl Related<super::global_defaults::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GlobalDefaults.def()
    }
}

impl Related<super::layer_type_defaults::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LayerTypeDefaults.def()
    }
}

impl Related<super::layers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Layers.def()
    }
}

impl Related<super::portal_tree_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TreeNodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A folder or leaf of a portal's navigation tree. Folder rows use the `folder_*` and
/// `expanded_default` columns; leaf rows use `layer_key`, `layer_title`, `glyph` and `tooltip`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portal_tree_nodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub portal_id: i32,
    pub parent_node_id: Option<i32>,
    pub is_folder: bool,
    pub folder_title: Option<String>,
    pub folder_id: Option<String>,
    pub expanded_default: Option<bool>,
    pub checked_default: Option<bool>,
    pub layer_key: Option<String>,
    pub layer_title: Option<String>,
    pub glyph: Option<String>,
    pub tooltip: Option<String>,
    pub display_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portals::Entity",
        from = "Column::PortalId",
        to = "super::portals::Column::Id"
    )]
    Portals,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentNodeId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "super::service_layers::Entity",
        from = "Column::LayerKey",
        to = "super::service_layers::Column::LayerKey"
    )]
    ServiceLayers,
}

impl Related<super::portals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

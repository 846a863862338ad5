use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "layers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub portal_id: i32,
    pub layer_key: String,
    pub layer_type: String, // 'wms', 'wfs', 'xyz', 'switchlayer', 'arcgisrest'
    pub title: Option<String>,
    pub grid_xtype: Option<String>,
    pub id_property: Option<String>,
    pub label_class_name: Option<String>,
    pub legend_width: Option<f64>,
    pub visibility: Option<bool>,
    pub vector_features_min_scale: Option<f64>,
    pub feature_info_window: Option<bool>,
    pub has_metadata: Option<bool>,
    pub is_base_layer: Option<bool>,
    pub qtip: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub open_layers: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tooltips_config: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub grouping: Option<Json>,
    /// Layer keys with no dedicated column, re-emitted verbatim
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extras: Option<Json>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portals::Entity",
        from = "Column::PortalId",
        to = "super::portals::Column::Id"
    )]
    Portals,
    #[sea_orm(has_one = "super::layer_server_options::Entity")]
    ServerOptions,
    #[sea_orm(has_one = "super::layer_xyz_options::Entity")]
    XyzOptions,
    #[sea_orm(has_many = "super::layer_styles::Entity")]
    Styles,
}

impl Related<super::portals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portals.def()
    }
}

impl Related<super::layer_server_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServerOptions.def()
    }
}

impl Related<super::layer_xyz_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::XyzOptions.def()
    }
}

impl Related<super::layer_styles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Styles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#![allow(dead_code)]

use anyhow::Result;
use layerconfig::database::connect_and_migrate;
use layerconfig::document::LayerDocument;
use layerconfig::services::NamedDocument;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

/// Fresh in-memory database with every migration applied
pub async fn setup_db() -> Result<DatabaseConnection> {
    Ok(connect_and_migrate(Some(":memory:")).await?)
}

pub fn named(source_name: &str, raw: Value) -> Result<NamedDocument> {
    Ok(NamedDocument {
        source_name: source_name.to_string(),
        document: LayerDocument::from_json(&raw, source_name)?,
    })
}

/// Defaults block covering every layer type
pub fn full_defaults() -> Value {
    json!({
        "projection": "EPSG:2157",
        "wms": {"visibility": false, "featureInfoWindow": true, "openLayers": {"singleTile": false}},
        "wfs": {"visibility": false, "vectorFeaturesMinScale": 20000},
        "xyz": {"isBaseLayer": true},
        "arcgisrest": {},
        "switchlayer": {"visibility": false},
    })
}

//! Import then export through an in-memory database

mod common;

use anyhow::Result;
use layerconfig::config::CompilerConfig;
use layerconfig::document::{DefaultsSet, LayerSpec};
use layerconfig::errors::ErrorCategory;
use layerconfig::repositories::{DefaultsRepository, LayerRepository};
use layerconfig::services::{ExportService, ImportService};
use serde_json::{json, Value};

use common::{full_defaults, named, setup_db};

#[tokio::test]
async fn test_pruned_document_round_trips() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig::default();

    // already pruned and ordered by (layerType, layerKey)
    let document = json!({
        "defaults": full_defaults(),
        "layers": [
            {
                "layerType": "arcgisrest",
                "layerKey": "ESRI_PARCELS",
                "title": "Parcels (ArcGIS)",
                "serverOptions": {"layers": "show:0"},
            },
            {
                "layerType": "switchlayer",
                "layerKey": "ROADS",
                "title": "Roads",
                "layers": [
                    {"layerType": "wfs", "layerKey": "ROADS_WFS", "title": "Roads", "featureType": "roads"},
                    {
                        "layerType": "wms",
                        "layerKey": "ROADS_WMS",
                        "title": "Roads",
                        "visibility": true,
                        "styles": [
                            {"name": "default", "title": "Default"},
                            {"name": "speed", "title": "Speed limits", "legendUrl": "https://example.com/legend.png"},
                        ],
                    },
                ],
            },
            {
                "layerType": "wms",
                "layerKey": "PARCELS",
                "title": "Parcels",
                "legendWidth": 150,
                "noCluster": true,
                "serverOptions": {"layers": "parcels", "version": "1.3.0", "srsName": "EPSG:2157"},
                "grouping": {"field": "county"},
            },
            {
                "layerType": "xyz",
                "layerKey": "BASEMAP",
                "url": "https://api.example.com/tiles/{z}/{x}/{y}.png?access_token=pk.secret",
                "openLayers": {"projection": "EPSG:3857", "tileSize": 512},
            },
        ],
    });

    ImportService::new(db.clone(), config.clone())
        .import_documents("default", &[named("default.json", document.clone())?])
        .await?;
    let exported = ExportService::new(db, config).export_portal("default").await?;

    assert_eq!(exported, document);
    Ok(())
}

#[tokio::test]
async fn test_fields_equal_to_defaults_are_pruned() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig::default();
    let document = json!({
        "defaults": full_defaults(),
        "layers": [{
            "layerType": "wms",
            "layerKey": "A",
            "visibility": false,
            "featureInfoWindow": false,
            "openLayers": {"singleTile": false},
        }],
    });

    ImportService::new(db.clone(), config.clone())
        .import_documents("default", &[named("a.json", document)?])
        .await?;
    let exported = ExportService::new(db, config).export_portal("default").await?;

    assert_eq!(
        exported["layers"],
        json!([{"layerType": "wms", "layerKey": "A", "featureInfoWindow": false}])
    );
    Ok(())
}

#[tokio::test]
async fn test_xyz_token_is_stored_apart_and_restored() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig::default();
    let url = "https://api.example.com/{z}/{x}/{y}?access_token=pk.abc&style=dark";
    let document = json!({
        "defaults": full_defaults(),
        "layers": [{"layerType": "xyz", "layerKey": "BASEMAP", "url": url}],
    });

    ImportService::new(db.clone(), config.clone())
        .import_documents("default", &[named("xyz.json", document)?])
        .await?;

    use layerconfig::database::entities::{layer_xyz_options, layers};
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    let layer = layers::Entity::find()
        .filter(layers::Column::LayerKey.eq("BASEMAP"))
        .one(&db)
        .await?
        .expect("layer row");
    let options = layer_xyz_options::Entity::find_by_id(layer.id)
        .one(&db)
        .await?
        .expect("xyz row");
    assert_eq!(
        options.url_template.as_deref(),
        Some("https://api.example.com/{z}/{x}/{y}?access_token={MAPBOX_TOKEN}&style=dark")
    );
    assert_eq!(options.access_token.as_deref(), Some("pk.abc"));

    let exported = ExportService::new(db, config).export_portal("default").await?;
    assert_eq!(exported["layers"][0]["url"], json!(url));
    Ok(())
}

#[tokio::test]
async fn test_top_level_order_and_switch_children_excluded() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig::default();
    let document = json!({
        "defaults": full_defaults(),
        "layers": [
            {"layerType": "wms", "layerKey": "Z_WMS"},
            {"layerType": "xyz", "layerKey": "A_XYZ"},
            {"layerType": "wms", "layerKey": "B_WMS"},
            {"layerType": "switchlayer", "layerKey": "SW", "layers": [
                {"layerType": "wms", "layerKey": "CHILD"},
            ]},
            {"layerType": "arcgisrest", "layerKey": "M_ESRI"},
        ],
    });

    ImportService::new(db.clone(), config.clone())
        .import_documents("default", &[named("order.json", document)?])
        .await?;
    let exported = ExportService::new(db, config).export_portal("default").await?;

    let keys: Vec<&str> = exported["layers"]
        .as_array()
        .expect("layers array")
        .iter()
        .filter_map(|layer| layer["layerKey"].as_str())
        .collect();
    assert_eq!(keys, vec!["M_ESRI", "SW", "B_WMS", "Z_WMS", "A_XYZ"]);
    assert_eq!(exported["layers"][1]["layers"][0]["layerKey"], json!("CHILD"));
    Ok(())
}

#[tokio::test]
async fn test_export_writes_file() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig::default();
    let document = json!({
        "defaults": full_defaults(),
        "layers": [{"layerType": "wms", "layerKey": "A", "title": "A"}],
    });
    ImportService::new(db.clone(), config.clone())
        .import_documents("default", &[named("a.json", document.clone())?])
        .await?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out").join("default.json");
    let count = ExportService::new(db, config)
        .export_to_file("default", &path, true)
        .await?;

    assert_eq!(count, 1);
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(written, document);
    Ok(())
}

#[tokio::test]
async fn test_export_requires_every_type_default() -> Result<()> {
    let db = setup_db().await?;
    let portal = DefaultsRepository::new(&db).ensure_portal("default").await?;
    let mut defaults = full_defaults();
    defaults.as_object_mut().expect("object").remove("wfs");
    DefaultsRepository::new(&db)
        .replace_defaults(
            portal.id,
            &DefaultsSet::from_json(defaults.as_object().expect("object")),
        )
        .await?;
    let layer = LayerSpec::from_json(&json!({"layerType": "wms", "layerKey": "A"}), "a.json")?;
    LayerRepository::new(&db).upsert_layer(portal.id, &layer).await?;

    let err = ExportService::new(db, CompilerConfig::default())
        .export_portal("default")
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "MISSING_TYPE_DEFAULTS");
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("wfs"));
    Ok(())
}

#[tokio::test]
async fn test_export_unknown_portal() -> Result<()> {
    let db = setup_db().await?;
    let err = ExportService::new(db, CompilerConfig::default())
        .export_portal("missing")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PORTAL_NOT_FOUND");
    Ok(())
}

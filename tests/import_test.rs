//! Batch import behaviour: defaults gate, integrity failures and rollback

mod common;

use std::path::PathBuf;

use anyhow::Result;
use layerconfig::config::CompilerConfig;
use layerconfig::database::entities::{layers, portals, switch_layer_children};
use layerconfig::services::{ExportService, ImportService, PortalService};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

use common::{full_defaults, named, setup_db};

fn write_file(dir: &tempfile::TempDir, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

#[tokio::test]
async fn test_missing_type_defaults_blocks_import() -> Result<()> {
    let db = setup_db().await?;
    let mut defaults = full_defaults();
    defaults.as_object_mut().expect("object").remove("wfs");
    let document = json!({
        "defaults": defaults,
        "layers": [{"layerType": "wms", "layerKey": "A"}],
    });

    let err = ImportService::new(db.clone(), CompilerConfig::default())
        .import_documents("default", &[named("a.json", document)?])
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "MISSING_TYPE_DEFAULTS");
    assert!(err.to_string().contains("wfs"));
    assert_eq!(layers::Entity::find().count(&db).await?, 0);
    assert_eq!(portals::Entity::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_import_without_defaults_needs_stored_defaults() -> Result<()> {
    let db = setup_db().await?;
    let service = ImportService::new(db.clone(), CompilerConfig::default());
    let layers_only = json!({"layers": [{"layerType": "wms", "layerKey": "A"}]});

    let err = service
        .import_documents("default", &[named("a.json", layers_only.clone())?])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "MISSING_TYPE_DEFAULTS");

    service
        .import_documents(
            "default",
            &[named("defaults.json", json!({"defaults": full_defaults()}))?],
        )
        .await?;
    let summary = service
        .import_documents("default", &[named("a.json", layers_only)?])
        .await?;
    assert_eq!(summary.layers_written, 1);
    assert_eq!(summary.defaults_saved, 0);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_key_writes_nothing() -> Result<()> {
    let db = setup_db().await?;
    let dir = tempfile::tempdir()?;
    let path = write_file(
        &dir,
        "dup.json",
        &json!({
            "defaults": full_defaults(),
            "layers": [
                {"layerType": "wms", "layerKey": "X"},
                {"layerType": "wms", "layerKey": "X"},
            ],
        }),
    )?;

    let err = ImportService::new(db.clone(), CompilerConfig::default())
        .import_files("default", &[path])
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "DUPLICATE_LAYER_KEY");
    assert!(err.to_string().contains("dup.json"));
    assert_eq!(layers::Entity::find().count(&db).await?, 0);
    assert_eq!(portals::Entity::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_failed_batch_rolls_back_defaults() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig::default();
    let service = ImportService::new(db.clone(), config.clone());
    service
        .import_documents(
            "default",
            &[named(
                "a.json",
                json!({"defaults": full_defaults(), "layers": [{"layerType": "wms", "layerKey": "A"}]}),
            )?],
        )
        .await?;

    // new defaults saved first in the batch, then rejected for lacking wfs
    let err = service
        .import_documents(
            "default",
            &[named(
                "b.json",
                json!({
                    "defaults": {"wms": {}, "xyz": {}, "arcgisrest": {}},
                    "layers": [{"layerType": "wms", "layerKey": "B"}],
                }),
            )?],
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "MISSING_TYPE_DEFAULTS");

    let exported = ExportService::new(db.clone(), config).export_portal("default").await?;
    assert_eq!(exported["defaults"], full_defaults());
    assert_eq!(exported["layers"], json!([{"layerType": "wms", "layerKey": "A"}]));
    assert_eq!(layers::Entity::find().count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_type_conflict_across_documents() -> Result<()> {
    let db = setup_db().await?;
    let err = ImportService::new(db.clone(), CompilerConfig::default())
        .import_documents(
            "default",
            &[
                named(
                    "a.json",
                    json!({"defaults": full_defaults(), "layers": [{"layerType": "wms", "layerKey": "A"}]}),
                )?,
                named("b.json", json!({"layers": [{"layerType": "wfs", "layerKey": "A"}]}))?,
            ],
        )
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "LAYER_TYPE_CONFLICT");
    assert_eq!(layers::Entity::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_switch_links_resolve_across_files() -> Result<()> {
    let db = setup_db().await?;
    let dir = tempfile::tempdir()?;
    let first = write_file(
        &dir,
        "switch.json",
        &json!({
            "defaults": full_defaults(),
            "layers": [{"layerType": "switchlayer", "layerKey": "SW", "layers": [
                {"layerType": "wms", "layerKey": "B", "title": "From switch"},
                {"layerType": "wms", "layerKey": "A"},
            ]}],
        }),
    )?;
    let second = write_file(
        &dir,
        "plain.json",
        &json!({"layers": [{"layerType": "wms", "layerKey": "B", "title": "Ignored"}]}),
    )?;

    let summary = ImportService::new(db.clone(), CompilerConfig::default())
        .import_files("default", &[first, second])
        .await?;

    assert_eq!(summary.documents, 2);
    assert_eq!(summary.layers_written, 3);
    assert_eq!(summary.switch_links, 2);
    assert_eq!(switch_layer_children::Entity::find().count(&db).await?, 2);

    let exported = ExportService::new(db, CompilerConfig::default())
        .export_portal("default")
        .await?;
    assert_eq!(
        exported["layers"],
        json!([{"layerType": "switchlayer", "layerKey": "SW", "layers": [
            {"layerType": "wms", "layerKey": "B", "title": "From switch"},
            {"layerType": "wms", "layerKey": "A"},
        ]}])
    );
    Ok(())
}

#[tokio::test]
async fn test_reimport_replaces_switch_children() -> Result<()> {
    let db = setup_db().await?;
    let service = ImportService::new(db.clone(), CompilerConfig::default());
    let switch = |children: Value| {
        json!({
            "defaults": full_defaults(),
            "layers": [{"layerType": "switchlayer", "layerKey": "SW", "layers": children}],
        })
    };

    service
        .import_documents(
            "default",
            &[named("a.json", switch(json!([
                {"layerType": "wms", "layerKey": "A"},
                {"layerType": "wms", "layerKey": "B"},
            ])))?],
        )
        .await?;
    service
        .import_documents(
            "default",
            &[named("a.json", switch(json!([{"layerType": "wms", "layerKey": "C"}])))?],
        )
        .await?;

    let links = switch_layer_children::Entity::find().all(&db).await?;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].position, 1);
    Ok(())
}

#[tokio::test]
async fn test_switchlayer_reimported_as_wms_releases_children() -> Result<()> {
    let db = setup_db().await?;
    let service = ImportService::new(db.clone(), CompilerConfig::default());
    service
        .import_documents(
            "default",
            &[named(
                "a.json",
                json!({
                    "defaults": full_defaults(),
                    "layers": [{"layerType": "switchlayer", "layerKey": "SW", "layers": [
                        {"layerType": "wms", "layerKey": "A"},
                    ]}],
                }),
            )?],
        )
        .await?;

    service
        .import_documents(
            "default",
            &[named(
                "b.json",
                json!({"layers": [
                    {"layerType": "wms", "layerKey": "SW"},
                    {"layerType": "wms", "layerKey": "A", "title": "A"},
                ]}),
            )?],
        )
        .await?;

    assert_eq!(switch_layer_children::Entity::find().count(&db).await?, 0);
    let exported = ExportService::new(db, CompilerConfig::default())
        .export_portal("default")
        .await?;
    assert_eq!(
        exported["layers"],
        json!([
            {"layerType": "wms", "layerKey": "A", "title": "A"},
            {"layerType": "wms", "layerKey": "SW"},
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_portal_allow_list() -> Result<()> {
    let db = setup_db().await?;
    let config = CompilerConfig {
        allowed_portals: vec!["default".to_string()],
        ..CompilerConfig::default()
    };
    let document = json!({"defaults": full_defaults(), "layers": []});
    let service = ImportService::new(db.clone(), config);

    let err = service
        .import_documents("rogue", &[named("a.json", document.clone())?])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PORTAL_NOT_ALLOWED");

    service
        .import_documents("default", &[named("a.json", document)?])
        .await?;
    let portals = PortalService::new(db).list_portals().await?;
    assert_eq!(portals.len(), 1);
    assert_eq!(portals[0].code, "default");
    Ok(())
}

#[tokio::test]
async fn test_unreadable_file_is_io_error() -> Result<()> {
    let db = setup_db().await?;
    let err = ImportService::new(db, CompilerConfig::default())
        .import_files("default", &[PathBuf::from("/nonexistent/layers.json")])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");
    Ok(())
}

use std::path::Path;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::common::write_json_file;
use crate::config::CompilerConfig;
use crate::document::{prune_object, DefaultsSet, LayerBody, LayerSpec};
use crate::errors::CompilerResult;
use crate::repositories::LayerRepository;
use crate::services::defaults_store::DefaultsStore;

/// Turns stored layers into pruned JSON layer objects.
pub struct DocumentBuilder<'a> {
    defaults: &'a DefaultsSet,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(defaults: &'a DefaultsSet) -> Self {
        Self { defaults }
    }

    /// Layer object with every field equal to its type default removed. `layerType` and
    /// `layerKey` come first and are never pruned; switchlayer children are built the same way
    /// against their own type defaults.
    pub fn build_layer(&self, spec: &LayerSpec) -> Value {
        let fields = spec.attribute_fields();
        let fields = match self.defaults.for_type(spec.layer_type) {
            Some(type_defaults) => prune_object(&fields, type_defaults),
            None => fields,
        };

        let mut out = Map::new();
        out.insert("layerType".to_string(), Value::from(spec.layer_type.as_str()));
        out.insert("layerKey".to_string(), Value::from(spec.layer_key.clone()));
        out.extend(fields);

        if let LayerBody::Switch(children) = &spec.body {
            let children = children.iter().map(|child| self.build_layer(child)).collect();
            out.insert("layers".to_string(), Value::Array(children));
        }
        Value::Object(out)
    }

    pub fn build_document(&self, layers: &[LayerSpec]) -> Value {
        let layers = layers.iter().map(|layer| self.build_layer(layer)).collect();
        let mut out = Map::new();
        out.insert("defaults".to_string(), self.defaults.to_json());
        out.insert("layers".to_string(), Value::Array(layers));
        Value::Object(out)
    }
}

pub struct ExportService {
    db: DatabaseConnection,
    config: CompilerConfig,
}

impl ExportService {
    pub fn new(db: DatabaseConnection, config: CompilerConfig) -> Self {
        Self { db, config }
    }

    /// The portal's layer document. Layers used as switchlayer children are only emitted inside
    /// their parent; top-level layers are ordered by `(layerType, layerKey)`.
    pub async fn export_portal(&self, portal_code: &str) -> CompilerResult<Value> {
        let txn = self.db.begin().await?;
        match self.build(&txn, portal_code).await {
            Ok(document) => {
                txn.commit().await?;
                Ok(document)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    /// Export to `path`; returns the number of top-level layers written.
    pub async fn export_to_file(
        &self,
        portal_code: &str,
        path: &Path,
        compact: bool,
    ) -> CompilerResult<usize> {
        let document = self.export_portal(portal_code).await?;
        let count = document
            .get("layers")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let bytes = write_json_file(path, &document, compact)?;
        info!(
            "Exported {} layers for portal {} to {} ({} bytes)",
            count,
            portal_code,
            path.display(),
            bytes
        );
        Ok(count)
    }

    async fn build<C: ConnectionTrait>(&self, conn: &C, portal_code: &str) -> CompilerResult<Value> {
        let (defaults, portal_id) = DefaultsStore::new(conn, &self.config)
            .load(portal_code)
            .await?;

        let repo = LayerRepository::new(conn);
        let policy = self.config.token_policy()?;
        let child_ids = repo.switch_child_ids(portal_id).await?;

        let mut rows = repo.list_layers(portal_id).await?;
        rows.retain(|row| !child_ids.contains(&row.id));
        rows.sort_by(|a, b| {
            (a.layer_type.as_str(), a.layer_key.as_str())
                .cmp(&(b.layer_type.as_str(), b.layer_key.as_str()))
        });

        let mut layers = Vec::with_capacity(rows.len());
        for row in &rows {
            layers.push(repo.load_spec(row, &policy).await?);
        }
        debug!(
            "Portal {}: {} top-level layers, {} switch children",
            portal_code,
            layers.len(),
            child_ids.len()
        );

        Ok(DocumentBuilder::new(&defaults).build_document(&layers))
    }
}

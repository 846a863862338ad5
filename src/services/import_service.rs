use std::collections::HashMap;
use std::path::PathBuf;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{debug, info, warn};

use crate::common::read_json_file;
use crate::config::CompilerConfig;
use crate::document::{DefaultsSet, LayerBody, LayerDocument, LayerSpec, LayerType};
use crate::errors::{CompilerResult, IntegrityError};
use crate::repositories::{DefaultsRepository, LayerRepository};
use crate::services::defaults_store::{require_type_defaults, DefaultsStore};

/// A parsed layer document and the name it is reported under
#[derive(Debug, Clone)]
pub struct NamedDocument {
    pub source_name: String,
    pub document: LayerDocument,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub portal_code: String,
    pub documents: usize,
    pub defaults_saved: usize,
    pub layers_written: usize,
    pub switch_links: usize,
}

/// Work for one import, worked out before anything is written.
///
/// `layers` holds every layer to materialise, depth-first across all documents, first occurrence
/// of each key only. `links` holds the child keys of each materialised switchlayer.
#[derive(Debug)]
pub struct ImportPlan<'a> {
    pub layers: Vec<&'a LayerSpec>,
    pub links: Vec<(&'a str, Vec<&'a str>)>,
}

impl<'a> ImportPlan<'a> {
    /// A key seen again with the same type is skipped; with a different type it fails.
    pub fn build(documents: &'a [NamedDocument]) -> Result<Self, IntegrityError> {
        let mut plan = ImportPlan {
            layers: Vec::new(),
            links: Vec::new(),
        };
        let mut seen: HashMap<&'a str, LayerType> = HashMap::new();

        for named in documents {
            for layer in &named.document.layers {
                if !plan.visit(layer, &mut seen, &named.source_name)? {
                    continue;
                }
                if let LayerBody::Switch(children) = &layer.body {
                    for child in children {
                        plan.visit(child, &mut seen, &named.source_name)?;
                    }
                    plan.links.push((layer.layer_key.as_str(), layer.child_keys()));
                }
            }
        }
        Ok(plan)
    }

    /// Returns true when `layer` is materialised by this visit.
    fn visit(
        &mut self,
        layer: &'a LayerSpec,
        seen: &mut HashMap<&'a str, LayerType>,
        source_name: &str,
    ) -> Result<bool, IntegrityError> {
        match seen.get(layer.layer_key.as_str()) {
            Some(first) if *first != layer.layer_type => Err(IntegrityError::LayerTypeConflict {
                key: layer.layer_key.clone(),
                first: first.to_string(),
                second: layer.layer_type.to_string(),
            }),
            Some(_) => {
                debug!(
                    "Layer {} in {} already materialised; skipping",
                    layer.layer_key, source_name
                );
                Ok(false)
            }
            None => {
                seen.insert(layer.layer_key.as_str(), layer.layer_type);
                self.layers.push(layer);
                Ok(true)
            }
        }
    }
}

pub struct ImportService {
    db: DatabaseConnection,
    config: CompilerConfig,
}

impl ImportService {
    pub fn new(db: DatabaseConnection, config: CompilerConfig) -> Self {
        Self { db, config }
    }

    /// Read, parse and import `paths` as one batch.
    pub async fn import_files(
        &self,
        portal_code: &str,
        paths: &[PathBuf],
    ) -> CompilerResult<ImportSummary> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let source_name = path.display().to_string();
            let value = read_json_file(path)?;
            let document = LayerDocument::from_json(&value, &source_name)?;
            documents.push(NamedDocument {
                source_name,
                document,
            });
        }
        self.import_documents(portal_code, &documents).await
    }

    /// Import every document in one transaction: defaults first, then all layers (phase 1),
    /// then switchlayer links (phase 2). Any failure rolls the whole batch back.
    pub async fn import_documents(
        &self,
        portal_code: &str,
        documents: &[NamedDocument],
    ) -> CompilerResult<ImportSummary> {
        self.config.check_portal_allowed(portal_code)?;
        let plan = ImportPlan::build(documents)?;

        let txn = self.db.begin().await?;
        match self.apply(&txn, portal_code, documents, &plan).await {
            Ok(summary) => {
                txn.commit().await?;
                info!(
                    "Imported {} layers ({} switch links) for portal {} from {} document(s)",
                    summary.layers_written,
                    summary.switch_links,
                    portal_code,
                    summary.documents
                );
                Ok(summary)
            }
            Err(err) => {
                warn!("Import for portal {} failed, rolling back: {}", portal_code, err);
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    async fn apply<C: ConnectionTrait>(
        &self,
        conn: &C,
        portal_code: &str,
        documents: &[NamedDocument],
        plan: &ImportPlan<'_>,
    ) -> CompilerResult<ImportSummary> {
        let portal = DefaultsRepository::new(conn).ensure_portal(portal_code).await?;
        let store = DefaultsStore::new(conn, &self.config);
        let mut summary = ImportSummary {
            portal_code: portal_code.to_string(),
            documents: documents.len(),
            ..Default::default()
        };

        let mut effective: Option<DefaultsSet> = None;
        for named in documents {
            if let Some(defaults) = &named.document.defaults {
                debug!("Saving defaults from {}", named.source_name);
                effective = Some(store.save(portal.id, defaults).await?);
                summary.defaults_saved += 1;
            }
        }
        match effective {
            Some(defaults) => require_type_defaults(portal_code, &defaults)?,
            None => {
                store.load(portal_code).await?;
            }
        }

        let repo = LayerRepository::new(conn);
        let policy = self.config.token_policy()?;
        let mut ids: HashMap<&str, i32> = HashMap::with_capacity(plan.layers.len());

        for layer in &plan.layers {
            let id = repo.upsert_layer(portal.id, layer).await?;
            repo.replace_body(id, &layer.body, &policy).await?;
            ids.insert(layer.layer_key.as_str(), id);
        }
        summary.layers_written = plan.layers.len();

        for (parent_key, child_keys) in &plan.links {
            let parent_id = layer_id(&ids, parent_key)?;
            let child_ids = child_keys
                .iter()
                .map(|key| layer_id(&ids, key))
                .collect::<Result<Vec<_>, _>>()?;
            repo.replace_switch_children(parent_id, &child_ids).await?;
            summary.switch_links += child_ids.len();
        }

        Ok(summary)
    }
}

fn layer_id(ids: &HashMap<&str, i32>, key: &str) -> Result<i32, sea_orm::DbErr> {
    ids.get(key)
        .copied()
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound(format!("layer {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(name: &str, raw: serde_json::Value) -> NamedDocument {
        NamedDocument {
            source_name: name.to_string(),
            document: LayerDocument::from_json(&raw, name).unwrap(),
        }
    }

    #[test]
    fn test_plan_is_depth_first_with_links() {
        let documents = vec![named(
            "a.json",
            json!({"layers": [
                {"layerType": "switchlayer", "layerKey": "SW", "layers": [
                    {"layerType": "wms", "layerKey": "B"},
                    {"layerType": "wms", "layerKey": "A"},
                ]},
                {"layerType": "wms", "layerKey": "C"},
            ]}),
        )];
        let plan = ImportPlan::build(&documents).unwrap();

        let keys: Vec<&str> = plan.layers.iter().map(|l| l.layer_key.as_str()).collect();
        assert_eq!(keys, vec!["SW", "B", "A", "C"]);
        assert_eq!(plan.links, vec![("SW", vec!["B", "A"])]);
    }

    #[test]
    fn test_plan_skips_repeats_across_documents() {
        let documents = vec![
            named("a.json", json!({"layers": [{"layerType": "wms", "layerKey": "A", "title": "first"}]})),
            named("b.json", json!({"layers": [{"layerType": "wms", "layerKey": "A", "title": "second"}]})),
        ];
        let plan = ImportPlan::build(&documents).unwrap();
        assert_eq!(plan.layers.len(), 1);
        assert_eq!(plan.layers[0].attributes.title.as_deref(), Some("first"));
    }

    #[test]
    fn test_plan_rejects_type_conflict() {
        let documents = vec![
            named("a.json", json!({"layers": [{"layerType": "wms", "layerKey": "A"}]})),
            named("b.json", json!({"layers": [{"layerType": "wfs", "layerKey": "A"}]})),
        ];
        let err = ImportPlan::build(&documents).unwrap_err();
        assert_eq!(err.error_code(), "LAYER_TYPE_CONFLICT");
    }
}

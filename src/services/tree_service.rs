use std::collections::BTreeSet;
use std::path::Path;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::common::{read_json_file, write_json_file};
use crate::config::CompilerConfig;
use crate::document::layer_key_closure;
use crate::errors::{CompilerResult, ConfigurationError};
use crate::repositories::{DefaultsRepository, TreeRepository};
use crate::tree::{check_registered, TreeDocument, TreeValidator};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeImportSummary {
    pub portal_code: String,
    pub nodes_written: usize,
    pub leaves: usize,
    pub nodes_replaced: u64,
}

pub struct TreeService {
    db: DatabaseConnection,
    config: CompilerConfig,
}

impl TreeService {
    pub fn new(db: DatabaseConnection, config: CompilerConfig) -> Self {
        Self { db, config }
    }

    /// Validate the tree file against the closure of the layer file and the service-layer
    /// registry, then replace the portal's stored tree.
    pub async fn import_tree_files(
        &self,
        portal_code: &str,
        tree_path: &Path,
        layers_path: &Path,
    ) -> CompilerResult<TreeImportSummary> {
        let tree_value = read_json_file(tree_path)?;
        let layers_value = read_json_file(layers_path)?;
        self.import_tree(
            portal_code,
            &tree_value,
            &tree_path.display().to_string(),
            &layers_value,
            &layers_path.display().to_string(),
        )
        .await
    }

    pub async fn import_tree(
        &self,
        portal_code: &str,
        tree_value: &Value,
        tree_name: &str,
        layers_value: &Value,
        layers_name: &str,
    ) -> CompilerResult<TreeImportSummary> {
        let txn = self.db.begin().await?;
        let result = self
            .replace_tree(&txn, portal_code, tree_value, tree_name, layers_value, layers_name)
            .await;
        match result {
            Ok(summary) => {
                txn.commit().await?;
                info!(
                    "Imported tree for portal {}: {} nodes, {} leaves",
                    portal_code, summary.nodes_written, summary.leaves
                );
                Ok(summary)
            }
            Err(err) => {
                warn!("Tree import for portal {} failed: {}", portal_code, err);
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    async fn replace_tree<C: ConnectionTrait>(
        &self,
        conn: &C,
        portal_code: &str,
        tree_value: &Value,
        tree_name: &str,
        layers_value: &Value,
        layers_name: &str,
    ) -> CompilerResult<TreeImportSummary> {
        let portal = DefaultsRepository::new(conn)
            .find_portal(portal_code)
            .await?
            .ok_or_else(|| ConfigurationError::PortalNotFound(portal_code.to_string()))?;

        let allowed = layer_key_closure(layers_value, layers_name)?;
        let tree = TreeDocument::from_json(tree_value, tree_name, portal_code)?;
        TreeValidator::new(&allowed, self.config.error_report_cap).validate(&tree, portal_code)?;

        let repo = TreeRepository::new(conn);
        let registered = repo.registered_keys().await?;
        check_registered(&tree, &registered, self.config.error_report_cap)?;

        let nodes_replaced = repo.delete_tree(portal.id).await?;
        let nodes_written = repo.insert_tree(portal.id, &tree).await?;
        debug!(
            "Portal {}: removed {} tree rows, wrote {}",
            portal_code, nodes_replaced, nodes_written
        );

        Ok(TreeImportSummary {
            portal_code: portal_code.to_string(),
            nodes_written,
            leaves: tree.leaf_keys().len(),
            nodes_replaced,
        })
    }

    /// The stored tree in the viewer's tree file format
    pub async fn export_tree(&self, portal_code: &str) -> CompilerResult<Value> {
        let portal = DefaultsRepository::new(&self.db)
            .find_portal(portal_code)
            .await?
            .ok_or_else(|| ConfigurationError::PortalNotFound(portal_code.to_string()))?;
        let tree = TreeRepository::new(&self.db).load_tree(portal.id).await?;
        Ok(tree.to_json())
    }

    pub async fn export_tree_to_file(&self, portal_code: &str, path: &Path) -> CompilerResult<usize> {
        let tree = self.export_tree(portal_code).await?;
        write_json_file(path, &tree, false)
    }

    /// Register every key of the layer document's closure in the service-layer registry.
    /// Returns `(closure size, newly registered)`.
    pub async fn register_layer_keys(
        &self,
        layers_value: &Value,
        layers_name: &str,
    ) -> CompilerResult<(usize, usize)> {
        let keys: BTreeSet<String> = layer_key_closure(layers_value, layers_name)?;
        let txn = self.db.begin().await?;
        let inserted = match TreeRepository::new(&txn).register_keys(&keys).await {
            Ok(inserted) => inserted,
            Err(err) => {
                txn.rollback().await?;
                return Err(err.into());
            }
        };
        txn.commit().await?;
        info!(
            "Registered {} new layer key(s) from {} ({} total)",
            inserted,
            layers_name,
            keys.len()
        );
        Ok((keys.len(), inserted))
    }

    pub async fn register_layer_keys_from_file(&self, layers_path: &Path) -> CompilerResult<(usize, usize)> {
        let value = read_json_file(layers_path)?;
        self.register_layer_keys(&value, &layers_path.display().to_string())
            .await
    }
}

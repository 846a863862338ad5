use std::collections::{BTreeSet, HashSet};

use super::node::{TreeDocument, TreeNodeSpec};
use crate::errors::{IntegrityError, UnresolvedReference};

/// Checks tree leaves against the layer keys a portal can resolve.
pub struct TreeValidator<'a> {
    allowed_keys: &'a BTreeSet<String>,
    report_cap: usize,
}

impl<'a> TreeValidator<'a> {
    pub fn new(allowed_keys: &'a BTreeSet<String>, report_cap: usize) -> Self {
        Self {
            allowed_keys,
            report_cap: report_cap.max(1),
        }
    }

    /// Depth-first over the tree. Every leaf whose key is outside the closure is collected;
    /// the error lists the first `report_cap` of them with their paths.
    pub fn validate(&self, tree: &TreeDocument, scope: &str) -> Result<(), IntegrityError> {
        let mut unresolved = Vec::new();
        let root = format!("{}/root", scope);
        self.visit(&tree.children, &root, &mut unresolved);

        if unresolved.is_empty() {
            return Ok(());
        }
        let total = unresolved.len();
        unresolved.truncate(self.report_cap);
        Err(IntegrityError::UnresolvedReferences {
            total,
            references: unresolved,
        })
    }

    fn visit(&self, children: &[TreeNodeSpec], path: &str, out: &mut Vec<UnresolvedReference>) {
        for (index, node) in children.iter().enumerate() {
            match node {
                TreeNodeSpec::Folder(folder) => {
                    let id = folder.id.as_deref().unwrap_or("<no-id>");
                    let path = format!("{}/{}:{}", path, index, id);
                    self.visit(&folder.children, &path, out);
                }
                TreeNodeSpec::Leaf(leaf) => {
                    if !self.allowed_keys.contains(&leaf.layer_key) {
                        out.push(UnresolvedReference {
                            id: leaf.layer_key.clone(),
                            path: format!("{}/{}:{}", path, index, leaf.layer_key),
                        });
                    }
                }
            }
        }
    }
}

/// Every leaf key must also exist in the service-layer registry. Missing keys are reported
/// sorted, capped at `report_cap`.
pub fn check_registered(
    tree: &TreeDocument,
    registered: &HashSet<String>,
    report_cap: usize,
) -> Result<(), IntegrityError> {
    let missing: BTreeSet<&str> = tree
        .leaf_keys()
        .into_iter()
        .filter(|key| !registered.contains(*key))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    Err(IntegrityError::UnregisteredLayerKeys {
        total: missing.len(),
        shown: missing
            .into_iter()
            .take(report_cap.max(1))
            .map(str::to_string)
            .collect(),
    })
}

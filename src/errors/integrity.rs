//! Referential integrity error types
//!
//! Covers duplicate layer keys, switchlayer composition rules, and navigation-tree nodes that
//! are malformed or reference layer keys the portal cannot resolve.

use std::fmt;

use thiserror::Error;

/// A tree leaf whose id is not resolvable from the layer document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub id: String,
    pub path: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}", self.id, self.path)
    }
}

#[derive(Error, Debug)]
pub enum IntegrityError {
    /// The same layerKey appears twice among one document's top-level entries
    #[error("Duplicate layerKey '{key}' among top-level layers of {source_name}")]
    DuplicateLayerKey { key: String, source_name: String },

    /// One layerKey is used with two different layer types in the same import
    #[error("Layer '{key}' is declared as both '{first}' and '{second}'")]
    LayerTypeConflict {
        key: String,
        first: String,
        second: String,
    },

    /// A switchlayer child that is not a wms, wfs or arcgisrest layer
    #[error("Switchlayer '{parent}' cannot contain '{child}' of type '{child_type}'")]
    InvalidSwitchChild {
        parent: String,
        child: String,
        child_type: String,
    },

    /// Tree leaves referencing layer keys missing from the layer document
    #[error(
        "Tree references {total} layer key(s) not in the portal layer document: {}",
        format_references(.references)
    )]
    UnresolvedReferences {
        total: usize,
        references: Vec<UnresolvedReference>,
    },

    /// Tree leaves whose keys are absent from the service-layer registry
    #[error(
        "Tree contains {total} layer key(s) not present in service_layers. First {}: {}",
        .shown.len(),
        .shown.join(", ")
    )]
    UnregisteredLayerKeys { total: usize, shown: Vec<String> },

    /// Structural problem with a tree node; traversal cannot continue
    #[error("Malformed tree node at {path}: {reason}")]
    MalformedTreeNode { path: String, reason: String },
}

fn format_references(references: &[UnresolvedReference]) -> String {
    references
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl IntegrityError {
    pub fn error_code(&self) -> &'static str {
        match self {
            IntegrityError::DuplicateLayerKey { .. } => "DUPLICATE_LAYER_KEY",
            IntegrityError::LayerTypeConflict { .. } => "LAYER_TYPE_CONFLICT",
            IntegrityError::InvalidSwitchChild { .. } => "INVALID_SWITCH_CHILD",
            IntegrityError::UnresolvedReferences { .. } => "UNRESOLVED_REFERENCE",
            IntegrityError::UnregisteredLayerKeys { .. } => "UNREGISTERED_LAYER_KEY",
            IntegrityError::MalformedTreeNode { .. } => "MALFORMED_TREE_NODE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_references_name_id_and_path() {
        let err = IntegrityError::UnresolvedReferences {
            total: 1,
            references: vec![UnresolvedReference {
                id: "Z".to_string(),
                path: "root/0:base/1:Z".to_string(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "Tree references 1 layer key(s) not in the portal layer document: 'Z' at root/0:base/1:Z"
        );
        assert_eq!(err.error_code(), "UNRESOLVED_REFERENCE");
    }

    #[test]
    fn test_unregistered_keys_report_shown_count() {
        let err = IntegrityError::UnregisteredLayerKeys {
            total: 3,
            shown: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Tree contains 3 layer key(s) not present in service_layers. First 2: a, b"
        );
    }
}

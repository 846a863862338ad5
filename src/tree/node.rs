use serde_json::{json, Map, Value};
use tracing::warn;

use crate::errors::{CompilerError, CompilerResult, IntegrityError};

const DEFAULT_FOLDER_TITLE: &str = "New folder";
const ICON_CLASS_PREFIX: &str = "x-fas ";

/// A navigation tree: the children of `treeConfig`, the implicit root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeDocument {
    pub children: Vec<TreeNodeSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNodeSpec {
    Folder(FolderSpec),
    Leaf(LeafSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderSpec {
    pub id: Option<String>,
    pub title: String,
    pub expanded: bool,
    pub checked: bool,
    pub children: Vec<TreeNodeSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafSpec {
    pub layer_key: String,
    pub title: Option<String>,
    /// Icon class or glyph, stored as given
    pub glyph: Option<String>,
    pub tooltip: Option<String>,
    pub checked: bool,
}

/// A node is a folder when it has a `children` array and is not flagged `leaf: true`.
pub fn is_folder(node: &Map<String, Value>) -> bool {
    matches!(node.get("children"), Some(Value::Array(_)))
        && node.get("leaf") != Some(&Value::Bool(true))
}

/// Booleans, or integers where non-zero is true. Anything else falls back to `default`.
fn boolish(node: &Map<String, Value>, key: &str, default: bool) -> bool {
    match node.get(key) {
        Some(Value::Bool(value)) => *value,
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.as_f64() != Some(0.0),
        _ => default,
    }
}

fn string(node: &Map<String, Value>, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty_string(node: &Map<String, Value>, key: &str) -> Option<String> {
    string(node, key).filter(|s| !s.is_empty())
}

/// Path segment `{index}:{id}` used in error reports
pub(crate) fn segment(index: usize, node: &Value) -> String {
    let id = match node {
        Value::Object(object) => object.get("id").and_then(Value::as_str).unwrap_or("<no-id>"),
        _ => "<non-dict>",
    };
    format!("{}:{}", index, id)
}

impl TreeDocument {
    /// Parse a tree file. `scope` prefixes node paths in errors, usually the portal code.
    pub fn from_json(value: &Value, source_name: &str, scope: &str) -> CompilerResult<Self> {
        let tree_config = value
            .get("treeConfig")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                CompilerError::parse(source_name, "missing or invalid 'treeConfig' object")
            })?;
        let children = match tree_config.get("children") {
            None => return Ok(TreeDocument::default()),
            Some(Value::Array(children)) => children,
            Some(_) => {
                return Err(CompilerError::parse(
                    source_name,
                    "'treeConfig.children' is not an array",
                ))
            }
        };

        let root = format!("{}/root", scope);
        let children = parse_children(children, &root)?;
        Ok(TreeDocument { children })
    }

    /// Tree file shape used by the map viewer
    pub fn to_json(&self) -> Value {
        json!({
            "defaults": {"general": {"leaf": true}},
            "treeConfig": {
                "id": "root",
                "leaf": false,
                "children": self.children.iter().map(TreeNodeSpec::to_json).collect::<Vec<_>>(),
            },
        })
    }

    /// Every leaf layer key, depth-first
    pub fn leaf_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        let mut stack: Vec<&TreeNodeSpec> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                TreeNodeSpec::Folder(folder) => stack.extend(folder.children.iter().rev()),
                TreeNodeSpec::Leaf(leaf) => keys.push(leaf.layer_key.as_str()),
            }
        }
        keys
    }
}

fn parse_children(children: &[Value], path: &str) -> Result<Vec<TreeNodeSpec>, IntegrityError> {
    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let path = format!("{}/{}", path, segment(index, child));
            TreeNodeSpec::from_json(child, &path)
        })
        .collect()
}

impl TreeNodeSpec {
    /// Parse one node; structural problems fail immediately, naming `path`.
    pub fn from_json(value: &Value, path: &str) -> Result<Self, IntegrityError> {
        let malformed = |reason: &str| IntegrityError::MalformedTreeNode {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let node = value
            .as_object()
            .ok_or_else(|| malformed("node is not an object"))?;

        if is_folder(node) {
            let children = match node.get("children") {
                Some(Value::Array(children)) => children.as_slice(),
                _ => &[],
            };
            if children.is_empty() {
                warn!("Folder at {} has an empty children list", path);
            }
            return Ok(TreeNodeSpec::Folder(FolderSpec {
                id: string(node, "id"),
                title: non_empty_string(node, "title")
                    .or_else(|| non_empty_string(node, "text"))
                    .unwrap_or_else(|| DEFAULT_FOLDER_TITLE.to_string()),
                expanded: boolish(node, "expanded", true),
                checked: boolish(node, "checked", false),
                children: parse_children(children, path)?,
            }));
        }

        let layer_key = string(node, "id")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| malformed("leaf has no string 'id'"))?;
        Ok(TreeNodeSpec::Leaf(LeafSpec {
            layer_key,
            title: non_empty_string(node, "text").or_else(|| non_empty_string(node, "title")),
            glyph: non_empty_string(node, "iconCls").or_else(|| non_empty_string(node, "glyph")),
            tooltip: string(node, "qtip"),
            checked: boolish(node, "checked", false),
        }))
    }

    pub fn to_json(&self) -> Value {
        match self {
            TreeNodeSpec::Folder(folder) => json!({
                "id": folder.id.clone().unwrap_or_default(),
                "leaf": false,
                "title": folder.title,
                "expanded": folder.expanded,
                "checked": folder.checked,
                "children": folder.children.iter().map(TreeNodeSpec::to_json).collect::<Vec<_>>(),
            }),
            TreeNodeSpec::Leaf(leaf) => {
                let mut node = Map::new();
                node.insert("id".to_string(), Value::from(leaf.layer_key.clone()));
                let text = leaf.title.clone().unwrap_or_else(|| leaf.layer_key.clone());
                node.insert("text".to_string(), Value::from(text));
                if let Some(glyph) = leaf.glyph.as_deref().filter(|g| !g.is_empty()) {
                    let key = if glyph.starts_with(ICON_CLASS_PREFIX) {
                        "iconCls"
                    } else {
                        "glyph"
                    };
                    node.insert(key.to_string(), Value::from(glyph));
                }
                if let Some(tooltip) = leaf.tooltip.as_deref().filter(|t| !t.is_empty()) {
                    node.insert("qtip".to_string(), Value::from(tooltip));
                }
                node.insert("checked".to_string(), Value::Bool(leaf.checked));
                Value::Object(node)
            }
        }
    }
}

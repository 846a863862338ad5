//! The nested layer JSON document
//!
//! A document is parsed once into [`LayerDocument`] (a typed intermediate representation) and
//! emitted back from it. Relational rows are produced from, and rebuilt into, the same types.

pub mod closure;
pub mod defaults;
pub mod layer;
pub mod layer_type;
pub mod pruning;
pub mod xyz_url;

use std::collections::HashSet;

use serde_json::{Map, Number, Value};

pub use closure::layer_key_closure;
pub use defaults::DefaultsSet;
pub use layer::{LayerAttributes, LayerBody, LayerSpec, ServerOptions, ServiceBody, StyleSpec, XyzBody};
pub use layer_type::LayerType;
pub use pruning::{deep_equal, prune, prune_object};
pub use xyz_url::TokenPolicy;

use crate::errors::{CompilerError, CompilerResult, IntegrityError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerDocument {
    /// `None` when the document carries no `defaults` key
    pub defaults: Option<DefaultsSet>,
    pub layers: Vec<LayerSpec>,
}

impl LayerDocument {
    /// Parse a document value. Top-level layer keys must be unique within the document.
    pub fn from_json(value: &Value, source_name: &str) -> CompilerResult<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| CompilerError::parse(source_name, "document root is not an object"))?;

        let defaults = match root.get("defaults") {
            None | Some(Value::Null) => None,
            Some(Value::Object(defaults)) => Some(DefaultsSet::from_json(defaults)),
            Some(_) => {
                return Err(CompilerError::parse(
                    source_name,
                    "'defaults' is not an object",
                ))
            }
        };

        let entries = match root.get("layers") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(entries)) => entries.as_slice(),
            Some(_) => return Err(CompilerError::parse(source_name, "'layers' is not an array")),
        };

        let mut seen = HashSet::new();
        let mut layers = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                return Err(CompilerError::parse(
                    source_name,
                    format!("layers[{}] is not an object", index),
                ));
            }
            let layer = LayerSpec::from_json(entry, source_name)?;
            if !seen.insert(layer.layer_key.clone()) {
                return Err(IntegrityError::DuplicateLayerKey {
                    key: layer.layer_key,
                    source_name: source_name.to_string(),
                }
                .into());
            }
            layers.push(layer);
        }

        Ok(LayerDocument { defaults, layers })
    }

    /// Parse JSON text. A leading byte-order mark is ignored.
    pub fn parse_str(text: &str, source_name: &str) -> CompilerResult<Self> {
        let value = parse_json_text(text, source_name)?;
        Self::from_json(&value, source_name)
    }

    /// Unpruned document, layers in their current order
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        if let Some(defaults) = &self.defaults {
            out.insert("defaults".to_string(), defaults.to_json());
        }
        let layers = self.layers.iter().map(LayerSpec::to_json).collect();
        out.insert("layers".to_string(), Value::Array(layers));
        Value::Object(out)
    }
}

/// Parse JSON text, naming `source_name` in the error
pub fn parse_json_text(text: &str, source_name: &str) -> CompilerResult<Value> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    serde_json::from_str(text).map_err(|e| CompilerError::parse(source_name, e.to_string()))
}

/// Numbers are stored as `f64`; integral values are emitted as JSON integers.
pub fn number_value(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_top_level_key_is_rejected() {
        let raw = json!({
            "layers": [
                {"layerType": "wms", "layerKey": "X"},
                {"layerType": "wfs", "layerKey": "X"},
            ]
        });
        let err = LayerDocument::from_json(&raw, "dup.json").unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_LAYER_KEY");
        assert!(err.to_string().contains("dup.json"));
    }

    #[test]
    fn test_child_key_may_repeat_a_top_level_key() {
        let raw = json!({
            "layers": [
                {"layerType": "wms", "layerKey": "A"},
                {"layerType": "switchlayer", "layerKey": "SW", "layers": [
                    {"layerType": "wms", "layerKey": "A"},
                ]},
            ]
        });
        let document = LayerDocument::from_json(&raw, "ok.json").unwrap();
        assert_eq!(document.layers.len(), 2);
        assert!(document.defaults.is_none());
    }

    #[test]
    fn test_bom_and_bad_json() {
        let document = LayerDocument::parse_str("\u{feff}{\"layers\": []}", "bom.json").unwrap();
        assert!(document.layers.is_empty());

        let err = LayerDocument::parse_str("{\"layers\": [", "broken.json").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
        assert!(err.to_string().starts_with("Failed to parse broken.json"));
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(20000.0), json!(20000));
        assert_eq!(number_value(0.5), json!(0.5));
        assert_eq!(number_value(-3.0), json!(-3));
    }
}

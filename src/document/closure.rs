use std::collections::BTreeSet;

use serde_json::Value;

use crate::errors::{CompilerError, CompilerResult};

/// Every layer key a tree may reference: top-level `layerKey`s plus the immediate children of
/// each switchlayer. Entries without a string key are skipped; a missing `layers` key is empty.
pub fn layer_key_closure(document: &Value, source_name: &str) -> CompilerResult<BTreeSet<String>> {
    let layers = match document.get("layers") {
        None => return Ok(BTreeSet::new()),
        Some(Value::Array(layers)) => layers,
        Some(_) => return Err(CompilerError::parse(source_name, "'layers' is not an array")),
    };

    let mut keys = BTreeSet::new();
    for layer in layers {
        if let Some(key) = layer_key(layer) {
            keys.insert(key.to_string());
        }
        if layer.get("layerType").and_then(Value::as_str) != Some("switchlayer") {
            continue;
        }
        match layer.get("layers") {
            None => {}
            Some(Value::Array(children)) => {
                keys.extend(children.iter().filter_map(layer_key).map(str::to_string))
            }
            Some(_) => {
                return Err(CompilerError::parse(
                    source_name,
                    format!(
                        "switchlayer '{}' has a non-array 'layers'",
                        layer_key(layer).unwrap_or("<no-key>")
                    ),
                ))
            }
        }
    }
    Ok(keys)
}

fn layer_key(layer: &Value) -> Option<&str> {
    layer
        .get("layerKey")
        .and_then(Value::as_str)
        .filter(|key| !key.trim().is_empty())
}

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::layer_type::LayerType;

/// A portal's `defaults` block: arbitrary global keys plus one object per layer type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultsSet {
    pub globals: Map<String, Value>,
    pub type_defaults: BTreeMap<LayerType, Map<String, Value>>,
}

impl DefaultsSet {
    /// Split a `defaults` object. A layer-type key only counts as type defaults when its value
    /// is an object; anything else is kept as a global.
    pub fn from_json(defaults: &Map<String, Value>) -> Self {
        let mut set = DefaultsSet::default();
        for (key, value) in defaults {
            match (key.parse::<LayerType>(), value) {
                (Ok(layer_type), Value::Object(object)) => {
                    set.type_defaults.insert(layer_type, object.clone());
                }
                _ => {
                    set.globals.insert(key.clone(), value.clone());
                }
            }
        }
        set
    }

    pub fn to_json(&self) -> Value {
        let mut out = self.globals.clone();
        for (layer_type, object) in &self.type_defaults {
            out.insert(layer_type.as_str().to_string(), Value::Object(object.clone()));
        }
        Value::Object(out)
    }

    pub fn for_type(&self, layer_type: LayerType) -> Option<&Map<String, Value>> {
        self.type_defaults.get(&layer_type)
    }

    /// Required types with no defaults object, in declaration order
    pub fn missing_required_types(&self) -> Vec<LayerType> {
        LayerType::REQUIRED_DEFAULTS
            .into_iter()
            .filter(|layer_type| !self.type_defaults.contains_key(layer_type))
            .collect()
    }

    /// Built-in switchlayer defaults inserted when a saved block carries none
    pub fn builtin_switchlayer_defaults() -> Map<String, Value> {
        match json!({
            "vectorFeaturesMinScale": 20000,
            "visibility": false,
            "featureInfoWindow": true,
        }) {
            Value::Object(object) => object,
            _ => Map::new(),
        }
    }
}

//! Defaults pruning
//!
//! Removes every field of a layer object that is deep-equal to the corresponding field of its
//! layer-type defaults. Objects present on both sides are pruned recursively, and an object that
//! ends up with no keys is dropped rather than kept as `{}`. Arrays are compared whole.
//!
//! Equality policy: numbers compare by value (`0 == 0.0`), booleans never equal numbers, `null`
//! only equals `null`, and strings compare exactly.

use serde_json::{Map, Number, Value};

/// Deep structural equality under the numeric policy described above.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, value)| right.get(key).is_some_and(|other| deep_equal(value, other)))
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        _ => a == b,
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    if let (Some(x), Some(y)) = (left.as_i64(), right.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (left.as_u64(), right.as_u64()) {
        return x == y;
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Prune `value` against `default`. Returns `None` when nothing survives.
pub fn prune(value: &Value, default: &Value) -> Option<Value> {
    match (value, default) {
        (Value::Object(object), Value::Object(defaults)) => {
            let pruned = prune_object(object, defaults);
            (!pruned.is_empty()).then_some(Value::Object(pruned))
        }
        _ => (!deep_equal(value, default)).then(|| value.clone()),
    }
}

/// Keys of `object` that differ from `defaults`; keys without a default are kept verbatim.
pub fn prune_object(object: &Map<String, Value>, defaults: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in object {
        match defaults.get(key) {
            None => {
                out.insert(key.clone(), value.clone());
            }
            Some(default) => {
                if let Some(kept) = prune(value, default) {
                    out.insert(key.clone(), kept);
                }
            }
        }
    }
    out
}

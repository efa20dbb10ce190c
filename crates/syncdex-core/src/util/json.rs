//! JSON document helpers.

use serde_json::Value;

/// Recursively merge `other` into `base`.
///
/// Objects merge key by key; any other value in `other` replaces the value
/// in `base`.
///
/// ```
/// use serde_json::json;
/// use syncdex_core::util::json::deep_merge;
///
/// let mut base = json!({"settings": {"shards": 1}, "mappings": {}});
/// deep_merge(&mut base, json!({"mappings": {"article": {"properties": {}}}}));
/// assert_eq!(base["settings"]["shards"], 1);
/// assert!(base["mappings"]["article"].is_object());
/// ```
pub fn deep_merge(base: &mut Value, other: Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, value) in other_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

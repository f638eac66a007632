//! Settings layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values.
///
/// Objects merge recursively by key; for every other pairing the overlay
/// replaces the base outright, including arrays and explicit nulls.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        (_, overlay) => overlay,
    }
}

/// Merge settings layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"project_name": "rocketpool"});
        let overlay = json!({"project_name": "node2"});
        let result = deep_merge(base, overlay);
        assert_eq!(result["project_name"], "node2");
    }

    #[test]
    fn test_nested_section_keeps_unset_keys() {
        let base = json!({
            "mev_boost": {
                "enabled": false,
                "mode": "local",
                "port": 18550
            }
        });
        let overlay = json!({
            "mev_boost": {
                "enabled": true
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["mev_boost"]["enabled"], true);
        assert_eq!(result["mev_boost"]["mode"], "local");
        assert_eq!(result["mev_boost"]["port"], 18550);
    }

    #[test]
    fn test_array_replace() {
        let base = json!({"flags": ["--a", "--b"]});
        let overlay = json!({"flags": ["--c"]});
        let result = deep_merge(base, overlay);

        let flags = result["flags"].as_array().unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0], "--c");
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({
            "data_directory": "~/.rocketpool",
            "metrics": {"enabled": false}
        });
        let file = json!({
            "data_directory": "/srv/node",
            "metrics": {"enabled": true}
        });
        let invocation = json!({
            "data_directory": "/mnt/node"
        });

        let result = merge_layers(vec![builtin, file, invocation]);

        assert_eq!(result["data_directory"], "/mnt/node");
        assert_eq!(result["metrics"]["enabled"], true);
    }
}

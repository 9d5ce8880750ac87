// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Right-biased deep merge of configuration trees.
//!
//! Mappings merge key by key, recursively. Every other value, lists
//! included, is replaced wholesale by the override.

use serde_yaml::Value;

/// Merge `overrides` into a copy of `base` and return it.
pub fn merge_dicts(base: &Value, overrides: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overrides);
    merged
}

/// Merge `overrides` into `base` in place.
pub fn merge_into(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Mapping(base_map), Value::Mapping(override_map)) => {
            for (key, override_value) in override_map {
                let both_mappings = override_value.is_mapping()
                    && base_map.get(key).map_or(false, Value::is_mapping);

                if both_mappings {
                    if let Some(base_value) = base_map.get_mut(key) {
                        merge_into(base_value, override_value);
                    }
                } else {
                    base_map.insert(key.clone(), override_value.clone());
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

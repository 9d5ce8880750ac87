// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run dimensions.
//!
//! [`Settings`] is the ordered key/value map that distinguishes one run from
//! another. The same type is used as a filter when querying the matrix, where
//! the [`ANY_VALUE`] marker matches every value and a `null` value matches
//! records that do not carry the key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Filter value meaning "any value for this key".
pub const ANY_VALUE: &str = "---";

/// Ordered map of setting name to setting value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

impl Settings {
    /// Create an empty settings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a setting, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a setting.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Get a setting value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a setting as a string slice, if it is a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over the settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Iterate over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Number of settings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no settings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of these settings without the wildcard entries.
    pub fn without_wildcards(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, v)| !is_wildcard(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Copy of these settings without the `null` (absent key) entries.
    pub fn without_absent(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Whether `self`, used as a filter, selects the given record settings.
    ///
    /// Every filter key must be present in `record` with an equal value,
    /// unless the filter value is the [`ANY_VALUE`] marker. A `null` filter
    /// value selects records without the key.
    pub fn matches(&self, record: &Settings) -> bool {
        self.0.iter().all(|(key, expected)| match record.get(key) {
            _ if is_wildcard(expected) => true,
            None => expected.is_null(),
            Some(actual) => actual == expected,
        })
    }

    /// Overlay `other` on top of these settings.
    pub fn extend(&mut self, other: &Settings) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

impl FromIterator<(String, Value)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Settings {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

fn is_wildcard(value: &Value) -> bool {
    value.as_str() == Some(ANY_VALUE)
}

/// Render a setting value for display: strings unquoted, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! The configuration store.
//!
//! A [`ConfigStore`] owns the live configuration document and, optionally,
//! the YAML file backing it. Every mutation goes through one mutex and is
//! persisted before the lock is released, so there is exactly one writer to
//! the file at any time. Callers share the store by reference.
//!
//! # Example
//!
//! ```no_run
//! use topsail_config::ConfigStore;
//!
//! let store = ConfigStore::open("artifacts/config.yaml")?;
//! store.apply_preset("light")?;
//! let mode = store.get("tests.e2e.mode")?;
//! # Ok::<(), topsail_config::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::path::{self, Segment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Name of the variable overrides file.
pub const VARIABLE_OVERRIDES_FILENAME: &str = "variable_overrides.yaml";

/// Key under which presets live.
pub const PRESETS_KEY: &str = "ci_presets";

const MAX_REFERENCE_DEPTH: usize = 16;

static MULTI_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{@([^}]+)\}").expect("valid reference regex"));

struct StoreState {
    document: Value,
    path: Option<PathBuf>,
}

/// Live configuration document with single-writer persistence.
pub struct ConfigStore {
    state: Mutex<StoreState>,
}

impl ConfigStore {
    /// In-memory store over `document`.
    pub fn from_value(document: Value) -> Self {
        Self {
            state: Mutex::new(StoreState {
                document,
                path: None,
            }),
        }
    }

    /// In-memory store parsed from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(Self::from_value(serde_yaml::from_str(content)?))
    }

    /// Load the store from `path`; mutations are written back to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let document = serde_yaml::from_str(&content)?;

        Ok(Self {
            state: Mutex::new(StoreState {
                document,
                path: Some(path.to_path_buf()),
            }),
        })
    }

    /// Persist future mutations to `path`.
    pub fn persist_to(self, path: impl Into<PathBuf>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.path = Some(path.into());
        }
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Get the value at `key`, with references resolved.
    pub fn get(&self, key: &str) -> Result<Value> {
        let value = self.get_raw(key)?;
        let resolved = self.resolve_reference(value, 0)?;
        debug!(key, "get_config");
        Ok(resolved)
    }

    /// Get the value at `key` as stored, without resolving references.
    pub fn get_raw(&self, key: &str) -> Result<Value> {
        let segments = path::parse(key)?;
        let state = self.state()?;
        path::lookup(&state.document, &segments)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Get the value at `key`, or `default` when it is missing.
    pub fn get_or(&self, key: &str, default: Value) -> Result<Value> {
        match self.get(key) {
            Err(Error::KeyNotFound(_)) => {
                warn!(key, "get_config: missing, returning the default value");
                Ok(default)
            }
            other => other,
        }
    }

    /// Whether `key` exists.
    pub fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_ok()
    }

    /// Replace the value at an existing `key`.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let segments = path::parse(key)?;
        let mut state = self.state()?;

        let slot = path::lookup_mut(&mut state.document, &segments)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        *slot = value;

        info!(key, "set_config");
        persist(&state)
    }

    /// Set the value at `key`, creating the leaf key when needed.
    ///
    /// The parent of `key` must already exist and be a mapping.
    pub fn insert(&self, key: &str, value: Value) -> Result<()> {
        let mut segments = path::parse(key)?;
        let leaf = match segments.pop() {
            Some(Segment::Key(leaf)) => leaf,
            Some(Segment::Index(_)) => return self.set(key, value),
            None => {
                let mut state = self.state()?;
                state.document = value;
                return persist(&state);
            }
        };

        let mut state = self.state()?;
        if state.document.is_null() && segments.is_empty() {
            state.document = Value::Mapping(Mapping::new());
        }

        match path::lookup_mut(&mut state.document, &segments) {
            Some(Value::Mapping(parent)) => {
                parent.insert(Value::String(leaf), value);
            }
            Some(_) => return Err(Error::InvalidPath(key.to_string())),
            None => return Err(Error::KeyNotFound(key.to_string())),
        }

        info!(key, "set_config (new key)");
        persist(&state)
    }

    /// Copy of the whole document.
    pub fn snapshot(&self) -> Result<Value> {
        Ok(self.state()?.document.clone())
    }

    /// YAML rendering of the whole document.
    pub fn dump_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.state()?.document)?)
    }

    /// Apply the preset `name` and, first, every preset it extends.
    pub fn apply_preset(&self, name: &str) -> Result<()> {
        let mut stack = Vec::new();
        self.apply_preset_inner(name, &mut stack)
    }

    fn apply_preset_inner(&self, name: &str, stack: &mut Vec<String>) -> Result<()> {
        if stack.iter().any(|applied| applied == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(Error::CircularExtends { chain });
        }

        let values = match self.get_raw(&format!("{PRESETS_KEY}[\"{name}\"]")) {
            Ok(Value::Mapping(values)) => values,
            Ok(Value::Null) | Err(Error::KeyNotFound(_)) => {
                return Err(Error::PresetNotFound(name.to_string()))
            }
            Ok(_) => return Err(Error::NotAMapping(format!("preset {name}"))),
            Err(e) => return Err(e),
        };

        info!(preset = name, "applying preset");
        self.record_applied_preset(name)?;

        stack.push(name.to_string());
        for (key, value) in values {
            let Some(key) = key.as_str() else {
                warn!(preset = name, "ignoring non-string preset key");
                continue;
            };

            if key == "extends" {
                for parent in preset_parents(name, value)? {
                    self.apply_preset_inner(&parent, stack)?;
                }
                continue;
            }

            info!("preset[{name}] {key} --> {}", inline_yaml(&value));
            self.set(key, value)?;
        }
        stack.pop();

        Ok(())
    }

    fn record_applied_preset(&self, name: &str) -> Result<()> {
        let names_key = format!("{PRESETS_KEY}.names");
        let mut names = match self.get_raw(&names_key) {
            Ok(Value::Sequence(names)) => names,
            _ => Vec::new(),
        };

        let entry = Value::String(name.to_string());
        if names.contains(&entry) {
            return Ok(());
        }
        names.push(entry);
        self.insert(&names_key, Value::Sequence(names))
    }

    /// Apply `key: value` overrides.
    ///
    /// Existing keys are replaced. A missing top-level key is created; a
    /// missing nested key fails unless `ignore_not_found` is set, in which
    /// case it is skipped.
    pub fn apply_overrides(&self, overrides: &Mapping, ignore_not_found: bool) -> Result<()> {
        for (key, value) in overrides {
            let key = key
                .as_str()
                .ok_or_else(|| Error::InvalidOverrides("override keys must be strings".into()))?;

            if self.contains(key) {
                self.set(key, value.clone())?;
            } else if ignore_not_found {
                debug!(key, "override target missing, skipping");
                continue;
            } else if key.contains('.') || key.contains('[') {
                return Err(Error::KeyNotFound(key.to_string()));
            } else {
                self.insert(key, value.clone())?;
            }

            info!("config override: {key} --> {}", inline_yaml(value));
        }
        Ok(())
    }

    /// Apply the overrides file at `path`. A missing file is not an error.
    pub fn apply_overrides_file(&self, path: impl AsRef<Path>, ignore_not_found: bool) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no variable overrides file, nothing to override");
            return Ok(());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        match serde_yaml::from_str(&content)? {
            Value::Mapping(overrides) => self.apply_overrides(&overrides, ignore_not_found),
            Value::Null => Ok(()),
            other => Err(Error::InvalidOverrides(format!(
                "expected a mapping in {}, got {}",
                path.display(),
                type_name(&other)
            ))),
        }
    }

    /// Set `key` to `value` until the returned guard is dropped.
    pub fn temp_value(&self, key: &str, value: Value) -> Result<TempValue<'_>> {
        let previous = self.get_raw(key)?;
        self.set(key, value)?;
        Ok(TempValue {
            store: self,
            key: key.to_string(),
            previous: Some(previous),
        })
    }

    fn resolve_reference(&self, value: Value, depth: usize) -> Result<Value> {
        let text = match value.as_str() {
            Some(text) if text.contains('@') => text.to_string(),
            _ => return Ok(value),
        };
        if depth >= MAX_REFERENCE_DEPTH {
            return Err(Error::InvalidReference(text));
        }

        if let Some(target) = text.strip_prefix('@') {
            let resolved = self.get_raw(target)?;
            let resolved = self.resolve_reference(resolved, depth + 1)?;
            debug!("resolve_reference: {text} ==> {}", inline_yaml(&resolved));
            return Ok(resolved);
        }

        if !MULTI_REFERENCE.is_match(&text) {
            return Ok(value);
        }

        let mut interpolated = text.clone();
        for capture in MULTI_REFERENCE.captures_iter(&text) {
            let target = &capture[1];
            let resolved = self.resolve_reference(self.get_raw(target)?, depth + 1)?;
            let rendered = match &resolved {
                Value::String(s) => s.clone(),
                other => inline_yaml(other),
            };
            interpolated = interpolated.replace(&capture[0], &rendered);
        }
        Ok(Value::String(interpolated))
    }
}

/// Restores the previous value of a key when dropped.
pub struct TempValue<'a> {
    store: &'a ConfigStore,
    key: String,
    previous: Option<Value>,
}

impl Drop for TempValue<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(e) = self.store.set(&self.key, previous) {
                warn!(key = self.key.as_str(), error = %e, "failed to restore temporary value");
            }
        }
    }
}

fn persist(state: &StoreState) -> Result<()> {
    let Some(path) = &state.path else {
        return Ok(());
    };
    let content = serde_yaml::to_string(&state.document)?;
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

fn preset_parents(name: &str, value: Value) -> Result<Vec<String>> {
    let invalid = || Error::InvalidExtends {
        name: format!("preset {name}"),
        reason: "expected a preset name or a list of names".to_string(),
    };
    match value {
        Value::String(parent) => Ok(vec![parent]),
        Value::Sequence(parents) => parents
            .into_iter()
            .map(|p| p.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// Single-line YAML rendering for log messages.
pub(crate) fn inline_yaml(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().replace('\n', " "))
            .unwrap_or_default(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
tests:
  e2e:
    mode: single
    namespace: watsonx
    models:
      - name: flan-t5
      - name: llama
kserve:
  model:
    runtime: standalone-tgis
    label: "{@tests.e2e.namespace}-{@kserve.model.runtime}"
    alias: "@tests.e2e.mode"
ci_presets:
  light:
    extends: [quick]
    tests.e2e.mode: light
  quick:
    tests.e2e.namespace: quick-ns
  broken:
    tests.e2e.unknown_key: 1
  loop_a:
    extends: loop_b
  loop_b:
    extends: loop_a
"#;

    fn store() -> ConfigStore {
        ConfigStore::from_yaml(CONFIG).unwrap()
    }

    #[test]
    fn test_get_and_missing_key() {
        let store = store();
        assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("single"));
        assert_eq!(store.get("tests.e2e.models[1].name").unwrap(), Value::from("llama"));
        assert!(matches!(store.get("tests.nope"), Err(Error::KeyNotFound(_))));
        assert_eq!(store.get_or("tests.nope", Value::from(3)).unwrap(), Value::from(3));
    }

    #[test]
    fn test_references_are_resolved() {
        let store = store();
        assert_eq!(store.get("kserve.model.alias").unwrap(), Value::from("single"));
        assert_eq!(
            store.get("kserve.model.label").unwrap(),
            Value::from("watsonx-standalone-tgis")
        );
        assert_eq!(
            store.get_raw("kserve.model.alias").unwrap(),
            Value::from("@tests.e2e.mode")
        );
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let store = ConfigStore::from_yaml("a: \"@a\"\n").unwrap();
        assert!(matches!(store.get("a"), Err(Error::InvalidReference(_))));
    }

    #[test]
    fn test_set_requires_existing_key() {
        let store = store();
        store.set("tests.e2e.mode", Value::from("multi")).unwrap();
        assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("multi"));
        assert!(matches!(
            store.set("tests.e2e.missing", Value::from(1)),
            Err(Error::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_insert_creates_leaf_only() {
        let store = store();
        store.insert("tests.e2e.consolidated_models", Value::Sequence(vec![])).unwrap();
        assert!(store.contains("tests.e2e.consolidated_models"));
        assert!(matches!(
            store.insert("tests.absent.key", Value::from(1)),
            Err(Error::KeyNotFound(_))
        ));
        assert!(matches!(
            store.insert("tests.e2e.mode.sub", Value::from(1)),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_apply_preset_with_extends() {
        let store = store();
        store.apply_preset("light").unwrap();

        assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("light"));
        assert_eq!(store.get("tests.e2e.namespace").unwrap(), Value::from("quick-ns"));
        assert_eq!(
            store.get("ci_presets.names").unwrap(),
            serde_yaml::from_str::<Value>("[light, quick]").unwrap()
        );
    }

    #[test]
    fn test_apply_preset_errors() {
        let store = store();
        assert!(matches!(store.apply_preset("absent"), Err(Error::PresetNotFound(_))));
        assert!(matches!(store.apply_preset("broken"), Err(Error::KeyNotFound(_))));
        assert!(matches!(
            store.apply_preset("loop_a"),
            Err(Error::CircularExtends { .. })
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let store = store();
        let overrides: Mapping =
            serde_yaml::from_str("tests.e2e.mode: longevity\nnew_top_level: 1\n").unwrap();
        store.apply_overrides(&overrides, false).unwrap();
        assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("longevity"));
        assert_eq!(store.get("new_top_level").unwrap(), Value::from(1));

        let nested: Mapping = serde_yaml::from_str("tests.e2e.nothing: 1\n").unwrap();
        assert!(store.apply_overrides(&nested, false).is_err());
        store.apply_overrides(&nested, true).unwrap();
        assert!(!store.contains("tests.e2e.nothing"));
    }

    #[test]
    fn test_temp_value_restores() {
        let store = store();
        {
            let _guard = store.temp_value("tests.e2e.mode", Value::from("dry")).unwrap();
            assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("dry"));
        }
        assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("single"));
    }

    #[test]
    fn test_mutations_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, CONFIG).unwrap();

        let store = ConfigStore::open(&path).unwrap();
        store.set("tests.e2e.mode", Value::from("multi")).unwrap();

        let reloaded = ConfigStore::open(&path).unwrap();
        assert_eq!(reloaded.get("tests.e2e.mode").unwrap(), Value::from("multi"));
    }

    #[test]
    fn test_overrides_file() {
        let dir = TempDir::new().unwrap();
        let store = store();

        store
            .apply_overrides_file(dir.path().join(VARIABLE_OVERRIDES_FILENAME), false)
            .unwrap();

        let path = dir.path().join(VARIABLE_OVERRIDES_FILENAME);
        fs::write(&path, "- not\n- a mapping\n").unwrap();
        assert!(matches!(
            store.apply_overrides_file(&path, false),
            Err(Error::InvalidOverrides(_))
        ));

        fs::write(&path, "tests.e2e.mode: from-file\n").unwrap();
        store.apply_overrides_file(&path, false).unwrap();
        assert_eq!(store.get("tests.e2e.mode").unwrap(), Value::from("from-file"));
    }
}

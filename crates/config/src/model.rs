// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model configuration consolidation.
//!
//! A model entry in the test configuration is either a plain document name,
//! or a mapping of override fields carrying a `name`. That `name` may itself
//! be a single-key mapping `{real-name: {overrides...}}`, which selects the
//! document `real-name` and layers the nested fields on top.
//!
//! The consolidated configuration merges, in increasing precedence:
//!
//! 1. the resolved document and its `extends` ancestry,
//! 2. the shared defaults stored in the configuration,
//! 3. the caller's override fields.

use crate::error::{Error, Result};
use crate::merge::{merge_dicts, merge_into};
use crate::resolver::Resolver;
use crate::source::DocumentSource;
use crate::store::ConfigStore;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Model name that lists the available documents instead of consolidating.
pub const HELP_SENTINEL: &str = "help";

/// Key of the model name in a model entry.
pub const NAME_KEY: &str = "name";

/// Key the model index is stamped under.
pub const INDEX_KEY: &str = "index";

/// File the consolidated model list is saved to.
pub const CONSOLIDATED_MODELS_FILENAME: &str = "consolidated_models.yaml";

/// How a model entry names its document.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelNameSpec {
    /// `name: flan-t5`
    Plain(String),
    /// `name: {flan-t5: {serving: ...}}`
    RenamedWithOverrides {
        /// Document name.
        name: String,
        /// Fields layered over the document.
        overrides: Mapping,
    },
}

impl ModelNameSpec {
    /// Interpret a `name` value.
    pub fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::Plain(name.clone())),
            Value::Mapping(map) if map.len() == 1 => {
                let (key, overrides) = map
                    .iter()
                    .next()
                    .ok_or_else(|| Error::InvalidModelName("empty mapping".into()))?;
                let name = key
                    .as_str()
                    .ok_or_else(|| Error::InvalidModelName("name key must be a string".into()))?
                    .to_string();
                let overrides = match overrides {
                    Value::Mapping(overrides) => overrides.clone(),
                    Value::Null => Mapping::new(),
                    _ => {
                        return Err(Error::InvalidModelName(format!(
                            "overrides of {name} must be a mapping"
                        )))
                    }
                };
                Ok(Self::RenamedWithOverrides { name, overrides })
            }
            Value::Mapping(map) => Err(Error::InvalidModelName(format!(
                "expected a single-key mapping, got {} keys",
                map.len()
            ))),
            _ => Err(Error::InvalidModelName(
                "expected a string or a single-key mapping".into(),
            )),
        }
    }

    /// The document name.
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(name) => name,
            Self::RenamedWithOverrides { name, .. } => name,
        }
    }
}

/// A model entry split into its name and override fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelEntry {
    /// Name declared by the entry, if any.
    pub name: Option<ModelNameSpec>,
    /// Every other field of the entry.
    pub overrides: Mapping,
}

impl ModelEntry {
    /// Interpret a model entry: null, a plain name, or a mapping.
    pub fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(name) => Ok(Self {
                name: Some(ModelNameSpec::Plain(name.clone())),
                overrides: Mapping::new(),
            }),
            Value::Mapping(map) => {
                let name = map.get(NAME_KEY).map(ModelNameSpec::parse).transpose()?;
                let overrides = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != Some(NAME_KEY))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok(Self { name, overrides })
            }
            _ => Err(Error::InvalidModelName(
                "model entry must be a name or a mapping".into(),
            )),
        }
    }
}

/// A fully merged model configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedConfig {
    /// Effective model name.
    pub name: String,
    /// Iteration index, when consolidated as part of a list.
    pub index: Option<usize>,
    /// Merged document.
    pub document: Value,
}

impl ConsolidatedConfig {
    /// YAML rendering of the document.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.document)?)
    }
}

/// Outcome of a consolidation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Consolidation<T> {
    /// The `help` sentinel was requested: the available document names.
    Help(Vec<String>),
    /// The consolidated result.
    Done(T),
}

impl<T> Consolidation<T> {
    /// The result, if this is not a help request.
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Help(_) => None,
        }
    }
}

/// Consolidates model configurations from documents and the config store.
pub struct ModelConsolidator<'a, S> {
    resolver: &'a Resolver<S>,
    store: &'a ConfigStore,
    defaults_key: Option<String>,
}

impl<'a, S: DocumentSource> ModelConsolidator<'a, S> {
    /// Create a consolidator without shared defaults.
    pub fn new(resolver: &'a Resolver<S>, store: &'a ConfigStore) -> Self {
        Self {
            resolver,
            store,
            defaults_key: None,
        }
    }

    /// Read the shared defaults from `key` in the store.
    pub fn with_defaults_key(mut self, key: impl Into<String>) -> Self {
        self.defaults_key = Some(key.into());
        self
    }

    /// Consolidate the model configured at `config_location`.
    ///
    /// The effective name is, in order: `model_name`, the entry's `name`
    /// field, or the plain string stored at the location. When a location is
    /// given, the consolidated document is written back to it.
    pub fn consolidate_model_config(
        &self,
        config_location: Option<&str>,
        model_name: Option<&str>,
        index: Option<usize>,
        show: bool,
    ) -> Result<Consolidation<ConsolidatedConfig>> {
        let entry = match config_location {
            Some(location) => self.store.get(location)?,
            None => Value::Null,
        };

        let label = config_location.unwrap_or("<arguments>");
        let outcome = self.consolidate_entry(&entry, label, model_name, index, show)?;

        if let (Some(location), Consolidation::Done(consolidated)) = (config_location, &outcome) {
            self.store.set(location, consolidated.document.clone())?;
        }

        Ok(outcome)
    }

    /// Consolidate the entries of the model list at `models_key`.
    ///
    /// With `name`, only the entry carrying that name (or a bare entry with
    /// it); with `index`, only that entry; otherwise every entry. The result
    /// is stored under `output_key` and, when `artifact_dir` is given, saved
    /// to [`CONSOLIDATED_MODELS_FILENAME`] there.
    pub fn consolidate_models(
        &self,
        models_key: &str,
        index: Option<usize>,
        name: Option<&str>,
        output_key: &str,
        artifact_dir: Option<&Path>,
    ) -> Result<Consolidation<Vec<ConsolidatedConfig>>> {
        let models = match self.store.get(models_key)? {
            Value::Sequence(models) => models,
            Value::Null => Vec::new(),
            _ => return Err(Error::InvalidPath(format!("{models_key} is not a list"))),
        };

        let selected: Vec<(Option<usize>, Value)> = match (name, index) {
            (Some(name), _) => {
                let found = models.iter().find(|model| {
                    ModelEntry::parse(model)
                        .ok()
                        .and_then(|entry| entry.name)
                        .map_or(false, |spec| spec.name() == name)
                });
                let entry = found.cloned().unwrap_or_else(|| {
                    let mut bare = Mapping::new();
                    bare.insert(NAME_KEY.into(), name.into());
                    Value::Mapping(bare)
                });
                vec![(index, entry)]
            }
            (None, Some(index)) => {
                let entry = models.get(index).cloned().ok_or_else(|| {
                    Error::InvalidPath(format!(
                        "requested model index #{index}, but only {} are defined",
                        models.len()
                    ))
                })?;
                vec![(Some(index), entry)]
            }
            (None, None) => models
                .into_iter()
                .enumerate()
                .map(|(i, model)| (Some(i), model))
                .collect(),
        };

        let mut consolidated = Vec::with_capacity(selected.len());
        for (entry_index, entry) in selected {
            let label = match entry_index {
                Some(i) => format!("{models_key}[{i}]"),
                None => models_key.to_string(),
            };
            match self.consolidate_entry(&entry, &label, None, entry_index, false)? {
                Consolidation::Done(model) => consolidated.push(model),
                Consolidation::Help(names) => return Ok(Consolidation::Help(names)),
            }
        }

        let documents: Vec<Value> = consolidated.iter().map(|m| m.document.clone()).collect();
        self.store.insert(output_key, Value::Sequence(documents.clone()))?;

        if let Some(dir) = artifact_dir {
            let path = dir.join(CONSOLIDATED_MODELS_FILENAME);
            let dump = serde_yaml::to_string(&Value::Sequence(documents))?;
            fs::write(&path, dump).map_err(|e| Error::io(&path, e))?;
            info!(path = %path.display(), count = consolidated.len(), "saved consolidated models");
        }

        Ok(Consolidation::Done(consolidated))
    }

    fn consolidate_entry(
        &self,
        entry: &Value,
        location: &str,
        model_name: Option<&str>,
        index: Option<usize>,
        show: bool,
    ) -> Result<Consolidation<ConsolidatedConfig>> {
        let entry = ModelEntry::parse(entry)?;

        let mut overrides = Value::Mapping(entry.overrides);
        if let Some(ModelNameSpec::RenamedWithOverrides {
            overrides: renamed, ..
        }) = &entry.name
        {
            merge_into(&mut overrides, &Value::Mapping(renamed.clone()));
        }

        let name = match (model_name, &entry.name) {
            (Some(name), _) => name.to_string(),
            (None, Some(spec)) => spec.name().to_string(),
            (None, None) => {
                return Err(Error::UnresolvedModelName {
                    location: location.to_string(),
                    partial: serde_yaml::to_string(&overrides)?,
                })
            }
        };

        if name == HELP_SENTINEL {
            let available = self.resolver.available()?;
            info!("available configurations: {}", available.join(", "));
            return Ok(Consolidation::Help(available));
        }

        let base = self.resolver.get_base_config(&name)?;
        let defaults = self.defaults()?;
        let mut document = merge_dicts(&base, &defaults);
        merge_into(&mut document, &overrides);

        if let Value::Mapping(map) = &mut document {
            map.insert(NAME_KEY.into(), Value::String(name.clone()));
            if let Some(index) = index {
                map.insert(INDEX_KEY.into(), Value::from(index as u64));
            }
        }

        let consolidated = ConsolidatedConfig {
            name,
            index,
            document,
        };

        if show {
            info!(
                "consolidated configuration of {}:\n{}",
                consolidated.name,
                consolidated.to_yaml()?
            );
        }

        Ok(Consolidation::Done(consolidated))
    }

    fn defaults(&self) -> Result<Value> {
        let Some(key) = &self.defaults_key else {
            return Ok(Value::Mapping(Mapping::new()));
        };

        match self.store.get_or(key, Value::Null)? {
            Value::Mapping(defaults) => Ok(Value::Mapping(defaults)),
            Value::Null => Ok(Value::Mapping(Mapping::new())),
            _ => {
                warn!(key = key.as_str(), "defaults are not a mapping, ignoring them");
                Ok(Value::Mapping(Mapping::new()))
            }
        }
    }
}

// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Settings of the `topsail` command itself.
//!
//! Layered, lowest precedence first: built-in defaults, the optional
//! `topsail.yaml` file, then `TOPSAIL_*` environment variables (nested keys
//! separated by `__`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use topsail_config::VARIABLE_OVERRIDES_FILENAME;

/// Default settings file.
pub const SETTINGS_FILE: &str = "topsail.yaml";

/// Prefix of the environment variables.
pub const ENV_PREFIX: &str = "TOPSAIL";

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CliSettings {
    /// Where artifacts (overrides, consolidated models) live.
    pub artifact_dir: PathBuf,
    /// Directory holding one YAML file per configuration document.
    pub documents_dir: PathBuf,
    /// Live configuration file backing the store.
    pub config_file: PathBuf,
    /// Store key of the shared model defaults.
    #[serde(default)]
    pub defaults_key: Option<String>,
}

impl CliSettings {
    /// Load the settings, reading `file` (or [`SETTINGS_FILE`]) if it exists.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_else(|| Path::new(SETTINGS_FILE));

        Config::builder()
            .set_default("artifact_dir", ".")?
            .set_default("documents_dir", "models")?
            .set_default("config_file", "config.yaml")?
            .add_source(File::from(file).format(FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Variable overrides file in the artifact directory.
    pub fn overrides_file(&self) -> PathBuf {
        self.artifact_dir.join(VARIABLE_OVERRIDES_FILENAME)
    }
}

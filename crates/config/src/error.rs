// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for configuration resolution and storage.

use thiserror::Error;

/// Errors that can occur while resolving or storing configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// No document with this name exists in the source.
    #[error("Configuration document not found: {name} (available: {})", available.join(", "))]
    DocumentNotFound {
        /// Requested document name.
        name: String,
        /// Names the source does provide.
        available: Vec<String>,
    },

    /// An `extends` chain loops back on itself.
    #[error("Circular extends chain: {}", chain.join(" -> "))]
    CircularExtends {
        /// The documents visited, ending with the repeated one.
        chain: Vec<String>,
    },

    /// An `extends` field has the wrong shape.
    #[error("Invalid extends in document {name}: {reason}")]
    InvalidExtends {
        /// Document carrying the field.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A document is not a mapping.
    #[error("Configuration document {0} is not a mapping")]
    NotAMapping(String),

    /// No model name could be determined.
    #[error("Could not determine the model name from {location}. Partial configuration:\n{partial}")]
    UnresolvedModelName {
        /// Where the model configuration was read from.
        location: String,
        /// YAML rendering of what was gathered so far.
        partial: String,
    },

    /// The `name` field has an unsupported shape.
    #[error("Invalid model name: {0}")]
    InvalidModelName(String),

    /// The key does not exist in the configuration.
    #[error("Key '{0}' not found in the configuration")]
    KeyNotFound(String),

    /// The key path cannot be parsed or walked.
    #[error("Invalid configuration path: {0}")]
    InvalidPath(String),

    /// The preset does not exist.
    #[error("Preset '{0}' does not exist")]
    PresetNotFound(String),

    /// The overrides file has the wrong shape.
    #[error("Invalid variable overrides: {0}")]
    InvalidOverrides(String),

    /// A configuration reference cannot be resolved.
    #[error("Invalid reference '{0}'")]
    InvalidReference(String),

    /// The store lock was poisoned by a panicking writer.
    #[error("Configuration store lock poisoned")]
    LockPoisoned,

    /// I/O failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// YAML (de)serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Wrap an I/O error with the path involved.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

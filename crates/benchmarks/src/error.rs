// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for loading results and writing reports.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading run records or writing reports.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A run directory or record that cannot be turned into a run record
    #[error("invalid run record at {path}: {reason}")]
    InvalidRecord {
        /// Where the record was read from
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for result loading and report output.
pub type Result<T> = std::result::Result<T, Error>;

// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration resolution for TOPSAIL test campaigns.
//!
//! This crate resolves named configuration documents through their
//! `extends` inheritance chains, consolidates model configurations with the
//! shared defaults and caller overrides, and owns the live configuration
//! store that presets and variable overrides are applied to.
//!
//! # Quick Start
//!
//! ```no_run
//! use topsail_config::{ConfigStore, DirectorySource, ModelConsolidator, Resolver};
//!
//! let resolver = Resolver::new(DirectorySource::new("testing/models"));
//! let store = ConfigStore::open("artifacts/config.yaml")?;
//!
//! let consolidated = ModelConsolidator::new(&resolver, &store)
//!     .with_defaults_key("tests.e2e.defaults")
//!     .consolidate_model_config(Some("tests.scale.model"), None, Some(0), true)?;
//! # Ok::<(), topsail_config::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`merge`] - Right-biased deep merge
//! - [`source`] - Named document sources
//! - [`resolver`] - `extends` chain resolution
//! - [`model`] - Model configuration consolidation
//! - [`store`] - The configuration store, presets and overrides
//! - [`path`] - Key path parsing

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod merge;
pub mod model;
pub mod path;
pub mod resolver;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use merge::{merge_dicts, merge_into};
pub use model::{
    ConsolidatedConfig, Consolidation, ModelConsolidator, ModelEntry, ModelNameSpec,
    HELP_SENTINEL,
};
pub use resolver::Resolver;
pub use source::{DirectorySource, DocumentSource, MappingSource};
pub use store::{ConfigStore, TempValue, VARIABLE_OVERRIDES_FILENAME};

/// Re-exported so callers can build documents without naming `serde_yaml`.
pub use serde_yaml::{Mapping, Value};

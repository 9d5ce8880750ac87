// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types shared by the TOPSAIL benchmark tooling.
//!
//! A benchmark campaign produces a set of [`RunRecord`]s. Each record pairs
//! the [`Settings`] that distinguish the run (engine, benchmark name,
//! concurrency, ...) with the parsed [`RunResults`] artifacts. The full set of
//! records lives in a [`RunMatrix`], which answers settings-filter queries.
//!
//! # Modules
//!
//! - [`settings`] - Run dimensions and filters
//! - [`record`] - Run records, result payloads and their builder
//! - [`matrix`] - The record universe and its queries

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod matrix;
pub mod record;
pub mod settings;

pub use matrix::RunMatrix;
pub use record::{BenchmarkMetrics, RunRecord, RunRecordBuilder, RunResults};
pub use settings::{display_value, Settings, ANY_VALUE};

/// Errors raised by the core types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required builder field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

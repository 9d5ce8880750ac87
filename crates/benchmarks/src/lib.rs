// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run aggregation and multi-configuration comparison for TOPSAIL
//! container engine benchmarks.
//!
//! # Quick Start
//!
//! ```no_run
//! use topsail_benchmarks::{
//!     generate_comparison_report, get_all_configuration_info, io, OutputFormat,
//! };
//!
//! let matrix = io::load_records("results/")?;
//! let grouped = get_all_configuration_info(&matrix, &matrix.static_settings());
//! let report = generate_comparison_report(&grouped);
//!
//! io::write_report(&report, "reports/", OutputFormat::Both)?;
//! # Ok::<(), topsail_benchmarks::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`aggregate`] - Run records to [`ConfigurationInfo`] summaries
//! - [`metrics`] - Resource usage averages
//! - [`label`] - Configuration labels
//! - [`compare`] - Shared/different fields, performance and usage deltas
//! - [`report`] - Per-benchmark comparison bundles
//! - [`table`] - Renderer-agnostic tables
//! - [`markdown`] - Markdown rendering
//! - [`io`] - Reading records and writing reports

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod compare;
pub mod error;
pub mod info;
pub mod io;
pub mod label;
pub mod markdown;
pub mod metrics;
pub mod report;
pub mod table;
pub mod units;

pub use aggregate::{get_all_configuration_info, get_info, safe_nested_get, ConfigurationsByBenchmark};
pub use compare::{
    calculate_usage_deltas, create_average_usage_comparison_table, create_engine_differences_table,
    create_performance_comparison_table, create_system_differences_table,
    find_shared_and_different_info, CommonField, DeltaStats, DifferentInfo, PerformanceComparison,
    PerformanceDelta, PerformanceRow, SharedInfo,
};
pub use error::{Error, Result};
pub use info::{
    ConfigurationInfo, EngineField, EngineInfo, EnginePlatform, SystemField, SystemInfo, SystemKind,
};
pub use io::OutputFormat;
pub use label::{format_field_value, generate_config_label, generate_display_config_label};
pub use metrics::{calculate_config_metrics, compute_metric_average, MetricType, UsageAverages};
pub use report::{generate_comparison_report, BenchmarkComparison, ComparisonReport};
pub use table::{Cell, Marker, Row, Table};

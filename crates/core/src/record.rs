// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run records and their parsed result payloads.
//!
//! Result payloads are semi-structured: every section is optional, and the
//! usage series are kept as raw JSON so that the aggregator decides, metric by
//! metric, what to do with missing or malformed data.

use crate::settings::Settings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parsed benchmark measurements of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkMetrics {
    /// 95th percentile of the execution time, in seconds.
    pub execution_time_95th_percentile: Option<f64>,
    /// Execution time jitter, in seconds.
    pub execution_time_jitter: Option<f64>,
    /// Command line of the benchmark.
    pub command: Option<Value>,
    /// When the benchmark ran, as a string or an epoch number.
    pub timestamp: Option<Value>,
    /// Sampling interval of the usage series, in seconds.
    pub interval: Option<f64>,
    /// CPU usage samples (percent).
    pub cpu: Option<Value>,
    /// Memory usage samples (percent).
    pub memory: Option<Value>,
    /// Network byte counts per interval: `{send: [...], recv: [...]}`.
    pub network: Option<Value>,
    /// Disk byte counts per interval: `{read: [...], write: [...]}`.
    pub disk: Option<Value>,
}

/// Result artifacts attached to a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunResults {
    /// Benchmark measurements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BenchmarkMetrics>,
    /// Host description (`Software/...`, `Hardware/...` sections).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_state: Option<Value>,
    /// Raw `podman info` / `docker info` output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_engine_info: Option<Value>,
    /// Test configuration captured with the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_config: Option<Value>,
    /// Any other parsed artifact.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One executed benchmark instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Dimensions distinguishing this run.
    pub settings: Settings,
    /// Parsed result artifacts.
    #[serde(default)]
    pub results: RunResults,
    /// Where the record was loaded from, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// When the record was loaded.
    #[serde(default = "Utc::now")]
    pub loaded_at: DateTime<Utc>,
}

impl RunRecord {
    /// Create a new builder.
    pub fn builder() -> RunRecordBuilder {
        RunRecordBuilder::default()
    }

    /// The `benchmark` setting, if any.
    pub fn benchmark(&self) -> Option<&str> {
        self.settings.get_str("benchmark")
    }

    /// Whether the record carries a metrics section.
    pub fn has_metrics(&self) -> bool {
        self.results.metrics.is_some()
    }
}

/// Builder for [`RunRecord`] instances.
#[derive(Default)]
pub struct RunRecordBuilder {
    settings: Settings,
    results: RunResults,
    location: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl RunRecordBuilder {
    /// Replace all settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Add one setting.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key, value);
        self
    }

    /// Set the metrics section.
    pub fn metrics(mut self, metrics: BenchmarkMetrics) -> Self {
        self.results.metrics = Some(metrics);
        self
    }

    /// Set the host description.
    pub fn system_state(mut self, state: Value) -> Self {
        self.results.system_state = Some(state);
        self
    }

    /// Set the raw container engine info.
    pub fn container_engine_info(mut self, info: Value) -> Self {
        self.results.container_engine_info = Some(info);
        self
    }

    /// Set the captured test configuration.
    pub fn test_config(mut self, config: Value) -> Self {
        self.results.test_config = Some(config);
        self
    }

    /// Add an extra artifact.
    pub fn artifact(mut self, key: impl Into<String>, value: Value) -> Self {
        self.results.extra.insert(key.into(), value);
        self
    }

    /// Set the source location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the load time. Defaults to `Utc::now()`.
    pub fn loaded_at(mut self, time: DateTime<Utc>) -> Self {
        self.loaded_at = Some(time);
        self
    }

    /// Build the [`RunRecord`]. A record without settings cannot be told
    /// apart from any other and is rejected.
    pub fn build(self) -> crate::Result<RunRecord> {
        if self.settings.is_empty() {
            return Err(crate::Error::MissingField("settings"));
        }

        Ok(RunRecord {
            settings: self.settings,
            results: self.results,
            location: self.location,
            loaded_at: self.loaded_at.unwrap_or_else(Utc::now),
        })
    }
}

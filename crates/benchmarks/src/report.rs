// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-benchmark comparison reports.

use crate::aggregate::ConfigurationsByBenchmark;
use crate::compare::{
    calculate_usage_deltas, create_average_usage_comparison_table, create_engine_differences_table,
    create_performance_comparison_table, create_system_differences_table, display_labels,
    find_shared_and_different_info, DeltaStats, DifferentInfo, PerformanceComparison, SharedInfo,
};
use crate::info::ConfigurationInfo;
use crate::label::format_benchmark_title;
use crate::metrics::MetricType;
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Title of the whole report.
pub const REPORT_TITLE: &str = "Container Engine Benchmark Comparison";

/// Everything computed for one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Benchmark name, as in the settings.
    pub benchmark: String,
    /// Display title of the benchmark.
    pub title: String,
    /// Display label of each configuration.
    pub labels: Vec<String>,
    /// Compared configurations, in aggregation order.
    pub configurations: Vec<ConfigurationInfo>,
    /// Values shared by every configuration.
    pub shared: SharedInfo,
    /// Fields that differ.
    pub different: DifferentInfo,
    /// Execution time comparison.
    pub performance: Option<PerformanceComparison>,
    /// Average resource usage.
    pub usage: Option<Table>,
    /// Differing host properties.
    pub system_differences: Option<Table>,
    /// Differing engine properties.
    pub engine_differences: Option<Table>,
    /// Per-metric usage spread.
    pub usage_deltas: BTreeMap<MetricType, DeltaStats>,
}

impl BenchmarkComparison {
    /// Compare the configurations of one benchmark.
    pub fn new(benchmark: impl Into<String>, configurations: Vec<ConfigurationInfo>) -> Self {
        let benchmark = benchmark.into();
        let (shared, different) = find_shared_and_different_info(&configurations);

        Self {
            title: format_benchmark_title(&benchmark),
            labels: display_labels(&configurations),
            performance: create_performance_comparison_table(&configurations),
            usage: create_average_usage_comparison_table(&configurations),
            system_differences: create_system_differences_table(&configurations, &different),
            engine_differences: create_engine_differences_table(&configurations, &different),
            usage_deltas: calculate_usage_deltas(&configurations),
            benchmark,
            configurations,
            shared,
            different,
        }
    }

    /// Tables in display order.
    pub fn tables(&self) -> Vec<Table> {
        let mut tables = Vec::new();
        if let Some(performance) = &self.performance {
            tables.push(performance.to_table());
        }
        tables.extend(self.usage.iter().cloned());
        tables.extend(self.system_differences.iter().cloned());
        tables.extend(self.engine_differences.iter().cloned());
        tables
    }
}

/// Comparison of every benchmark in a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Report title.
    pub title: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// One entry per benchmark, sorted by benchmark name.
    pub benchmarks: Vec<BenchmarkComparison>,
}

impl ComparisonReport {
    /// Entry for one benchmark.
    pub fn benchmark(&self, name: &str) -> Option<&BenchmarkComparison> {
        self.benchmarks.iter().find(|b| b.benchmark == name)
    }

    /// Whether no benchmark was found.
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

/// Build the comparison of every benchmark group.
pub fn generate_comparison_report(by_benchmark: &ConfigurationsByBenchmark) -> ComparisonReport {
    let benchmarks: Vec<BenchmarkComparison> = by_benchmark
        .iter()
        .map(|(benchmark, configurations)| {
            debug!(benchmark = %benchmark, configurations = configurations.len(), "comparing benchmark");
            BenchmarkComparison::new(benchmark.clone(), configurations.clone())
        })
        .collect();

    info!(benchmarks = benchmarks.len(), "comparison report generated");

    ComparisonReport {
        title: REPORT_TITLE.to_string(),
        generated_at: Utc::now(),
        benchmarks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topsail_core::Settings;

    fn config(engine: &str, exec_time: f64) -> ConfigurationInfo {
        ConfigurationInfo {
            config_label: engine.to_string(),
            settings: Settings::new().with("container_engine", engine),
            exec_time: Some(exec_time),
            runs: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_comparison_report() {
        let mut grouped = ConfigurationsByBenchmark::new();
        grouped.insert("fio_seq".into(), vec![config("podman", 2.0), config("docker", 1.0)]);
        grouped.insert("iperf".into(), vec![config("podman", 4.0)]);

        let report = generate_comparison_report(&grouped);
        assert_eq!(report.benchmarks.len(), 2);

        let fio = report.benchmark("fio_seq").unwrap();
        assert_eq!(fio.title, "Fio Seq");
        assert_eq!(fio.labels, vec!["podman", "docker"]);
        assert!(fio.performance.as_ref().unwrap().delta.is_some());
        // no usage data at all
        assert!(fio.usage.is_none());
        assert_eq!(fio.tables().len(), 2);

        let iperf = report.benchmark("iperf").unwrap();
        assert!(iperf.different.is_empty());
        assert!(iperf.engine_differences.is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = generate_comparison_report(&ConfigurationsByBenchmark::new());
        assert!(report.is_empty());
        assert_eq!(report.title, REPORT_TITLE);
    }
}

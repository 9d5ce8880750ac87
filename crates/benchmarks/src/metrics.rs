// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource usage averages.
//!
//! CPU and memory are plain percentage samples. Network and disk are byte
//! counts per sampling interval, converted to MB/s before averaging. A
//! metric whose series is missing, empty, non-numeric or would divide by
//! zero is omitted: panels tolerate partial data.

use crate::units::BYTES_TO_MEGABYTES;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use topsail_core::{BenchmarkMetrics, RunMatrix, Settings};
use tracing::warn;

/// Average value per metric. A metric without data has no entry.
pub type UsageAverages = BTreeMap<MetricType, f64>;

/// Resource usage metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// CPU usage
    Cpu,
    /// Memory usage
    Memory,
    /// Network send throughput
    NetworkSend,
    /// Network receive throughput
    NetworkRecv,
    /// Disk read throughput
    DiskRead,
    /// Disk write throughput
    DiskWrite,
}

impl MetricType {
    /// All supported metrics, in display order.
    pub const ALL: [MetricType; 6] = [
        Self::Cpu,
        Self::Memory,
        Self::NetworkSend,
        Self::NetworkRecv,
        Self::DiskRead,
        Self::DiskWrite,
    ];

    /// Metric key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::NetworkSend => "network_send",
            Self::NetworkRecv => "network_recv",
            Self::DiskRead => "disk_read",
            Self::DiskWrite => "disk_write",
        }
    }

    /// Row label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "Average CPU Usage",
            Self::Memory => "Average Memory Usage",
            Self::NetworkSend => "Average Network Send",
            Self::NetworkRecv => "Average Network Recv",
            Self::DiskRead => "Average Disk Read",
            Self::DiskWrite => "Average Disk Write",
        }
    }

    /// Display unit.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Cpu | Self::Memory => "%",
            _ => "MB/s",
        }
    }
}

/// Average of one metric over a run's samples.
pub fn compute_metric_average(
    metrics: &BenchmarkMetrics,
    metric: MetricType,
    interval: f64,
) -> Option<f64> {
    match metric {
        MetricType::Cpu => simple_average(metrics.cpu.as_ref()?),
        MetricType::Memory => simple_average(metrics.memory.as_ref()?),
        MetricType::NetworkSend => throughput_average(metrics.network.as_ref()?, "send", interval),
        MetricType::NetworkRecv => throughput_average(metrics.network.as_ref()?, "recv", interval),
        MetricType::DiskRead => throughput_average(metrics.disk.as_ref()?, "read", interval),
        MetricType::DiskWrite => throughput_average(metrics.disk.as_ref()?, "write", interval),
    }
}

/// Usage averages of the runs selected by `filter`.
///
/// When several runs match, later runs overwrite earlier ones metric by
/// metric.
pub fn calculate_config_metrics(matrix: &RunMatrix, filter: &Settings) -> UsageAverages {
    let mut averages = UsageAverages::new();

    for record in matrix.filter_records(filter) {
        let Some(metrics) = &record.results.metrics else {
            continue;
        };
        averages.extend(run_usage_averages(metrics));
    }

    averages
}

/// Usage averages of a single run.
pub fn run_usage_averages(metrics: &BenchmarkMetrics) -> UsageAverages {
    let interval = metrics.interval.unwrap_or(1.0);

    MetricType::ALL
        .iter()
        .filter_map(|metric| match compute_metric_average(metrics, *metric, interval) {
            Some(average) => Some((*metric, average)),
            None => {
                warn!(metric = metric.key(), "run has no usable samples, omitting metric");
                None
            }
        })
        .collect()
}

fn numeric_series(value: &Value) -> Option<Vec<f64>> {
    let samples = value.as_array()?;
    if samples.is_empty() {
        return None;
    }
    samples.iter().map(Value::as_f64).collect()
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn simple_average(series: &Value) -> Option<f64> {
    numeric_series(series).map(|samples| mean(&samples))
}

fn throughput_average(container: &Value, key: &str, interval: f64) -> Option<f64> {
    if interval == 0.0 || !interval.is_finite() {
        return None;
    }

    let samples = numeric_series(container.as_object()?.get(key)?)?;
    let mb_per_second: Vec<f64> = samples
        .iter()
        .map(|bytes| (bytes / BYTES_TO_MEGABYTES) / interval)
        .collect();
    Some(mean(&mb_per_second))
}

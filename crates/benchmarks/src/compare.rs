// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-configuration comparison.
//!
//! Every function here is a pure transform of a slice of
//! [`ConfigurationInfo`] belonging to one benchmark. Computations that need
//! at least two configurations to be meaningful return empty results instead
//! of failing.

use crate::info::{ConfigurationInfo, EngineField, SystemField, NOT_AVAILABLE};
use crate::label::{format_field_value, generate_display_config_label};
use crate::metrics::MetricType;
use crate::table::{Cell, Marker, Row, Table};
use crate::units::format_duration;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Label of the delta row and column.
pub const DELTA_LABEL: &str = "Performance Delta";

/// Prefix of delta values.
pub const DELTA_SYMBOL: &str = "Δ";

/// Scalar fields compared across configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommonField {
    /// Number of benchmark repetitions
    Runs,
    /// Machine provider
    ContainerEngineProvider,
    /// `container_engine` setting
    ContainerEngine,
    /// Benchmark command line
    Command,
    /// Run timestamp
    Timestamp,
}

impl CommonField {
    /// All fields, in display order.
    pub const ALL: [CommonField; 5] = [
        Self::Runs,
        Self::ContainerEngineProvider,
        Self::ContainerEngine,
        Self::Command,
        Self::Timestamp,
    ];

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Runs => "Runs",
            Self::ContainerEngineProvider => "Provider",
            Self::ContainerEngine => "Engine",
            Self::Command => "Command",
            Self::Timestamp => "Timestamp",
        }
    }

    /// Value of this field in `config`, `N/A` when missing.
    pub fn value_of(&self, config: &ConfigurationInfo) -> String {
        let value = match self {
            Self::Runs => return config.runs.to_string(),
            Self::ContainerEngineProvider => config.container_engine_provider.as_deref(),
            Self::ContainerEngine => config.container_engine(),
            Self::Command => config.command.as_deref(),
            Self::Timestamp => config.timestamp.as_deref(),
        };
        value.unwrap_or(NOT_AVAILABLE).to_string()
    }
}

/// Values identical across every compared configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedInfo {
    /// Host fields.
    pub system: BTreeMap<SystemField, String>,
    /// Engine fields, formatted for display.
    pub engine: BTreeMap<EngineField, String>,
    /// Scalar fields.
    pub common: BTreeMap<CommonField, String>,
}

/// Fields whose value differs between at least two configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentInfo {
    /// Host fields.
    pub system: BTreeSet<SystemField>,
    /// Engine fields.
    pub engine: BTreeSet<EngineField>,
    /// Scalar fields.
    pub common: BTreeSet<CommonField>,
}

impl DifferentInfo {
    /// Whether nothing differs.
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.engine.is_empty() && self.common.is_empty()
    }
}

fn system_value(config: &ConfigurationInfo, field: SystemField) -> String {
    config
        .system
        .as_ref()
        .map_or_else(|| NOT_AVAILABLE.to_string(), |s| s.get(field).to_string())
}

fn engine_value(config: &ConfigurationInfo, field: EngineField) -> String {
    let raw = config
        .container_engine_info
        .as_ref()
        .and_then(|e| e.get(field))
        .unwrap_or(NOT_AVAILABLE);
    format_field_value(field, raw)
}

fn partition<F, V>(
    fields: &[F],
    configs: &[ConfigurationInfo],
    value_of: V,
) -> (BTreeMap<F, String>, BTreeSet<F>)
where
    F: Copy + Ord,
    V: Fn(&ConfigurationInfo, F) -> String,
{
    let mut shared = BTreeMap::new();
    let mut different = BTreeSet::new();

    for &field in fields {
        let mut values: BTreeSet<String> = configs.iter().map(|c| value_of(c, field)).collect();
        if values.len() == 1 {
            if let Some(value) = values.pop_first() {
                shared.insert(field, value);
            }
        } else {
            different.insert(field);
        }
    }

    (shared, different)
}

/// Split the tracked fields into those shared by every configuration and
/// those that differ. Missing values compare as `N/A`.
///
/// Returns empty results for fewer than two configurations.
pub fn find_shared_and_different_info(configs: &[ConfigurationInfo]) -> (SharedInfo, DifferentInfo) {
    if configs.len() <= 1 {
        return (SharedInfo::default(), DifferentInfo::default());
    }

    let (system, different_system) = partition(&SystemField::ALL, configs, system_value);
    let (engine, different_engine) = partition(&EngineField::ALL, configs, engine_value);
    let (common, different_common) = partition(&CommonField::ALL, configs, |c, f| f.value_of(c));

    (
        SharedInfo {
            system,
            engine,
            common,
        },
        DifferentInfo {
            system: different_system,
            engine: different_engine,
            common: different_common,
        },
    )
}

/// Display label of every configuration, in order.
pub fn display_labels(configs: &[ConfigurationInfo]) -> Vec<String> {
    configs
        .iter()
        .map(|c| generate_display_config_label(c, configs))
        .collect()
}

/// One configuration in the performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    /// Display label.
    pub label: String,
    /// 95th percentile execution time, in seconds.
    pub exec_time: Option<f64>,
    /// Jitter, in seconds.
    pub jitter: Option<f64>,
    /// Number of benchmark repetitions.
    pub runs: u64,
    /// Whether this is the fastest configuration.
    pub fastest: bool,
}

/// Spread between the fastest and the slowest configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDelta {
    /// Fastest positive execution time.
    pub fastest_time: f64,
    /// Slowest positive execution time.
    pub slowest_time: f64,
    /// `slowest - fastest`.
    pub delta: f64,
    /// Delta relative to the fastest time, in percent.
    pub percentage: f64,
}

impl PerformanceDelta {
    /// `Δ 3.00s (33.3% difference)`
    pub fn display(&self) -> String {
        format!("{} {}", self.value_text(), self.percentage_text())
    }

    fn value_text(&self) -> String {
        format!("{DELTA_SYMBOL} {}", format_duration(self.delta))
    }

    fn percentage_text(&self) -> String {
        format!("({:.1}% difference)", self.percentage)
    }
}

/// Execution times of one benchmark, fastest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceComparison {
    /// One row per configuration.
    pub rows: Vec<PerformanceRow>,
    /// Present when at least two configurations have a positive time.
    pub delta: Option<PerformanceDelta>,
}

impl PerformanceComparison {
    /// Render as a table, with a trailing delta row when there is one.
    pub fn to_table(&self) -> Table {
        let headers = ["Configuration", "Execution Time (95th Percentile)", "Jitter", "Runs"];
        let mut table = Table::new(
            "Performance Metrics",
            headers.iter().map(|h| h.to_string()).collect(),
        );

        for row in &self.rows {
            let mut time = match row.exec_time.filter(|t| *t > 0.0) {
                Some(t) => Cell::new(format_duration(t))
                    .with_note(format!("(Average of {} runs)", row.runs)),
                None => Cell::new(NOT_AVAILABLE),
            };
            if row.fastest {
                time = time.with_marker(Marker::Fastest);
            }
            let jitter = match row.jitter {
                Some(j) => Cell::new(format!("+- {}", format_duration(j))),
                None => Cell::new(NOT_AVAILABLE),
            };
            table.push(Row::new(
                row.label.clone(),
                vec![time, jitter, Cell::new(row.runs.to_string())],
            ));
        }

        if let Some(delta) = &self.delta {
            table.push(Row::new(
                DELTA_LABEL,
                vec![
                    Cell::new(delta.value_text()).with_note(delta.percentage_text()),
                    Cell::empty(),
                    Cell::empty(),
                ],
            ));
        }

        table
    }
}

fn compare_exec_times(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Execution time comparison, sorted ascending.
///
/// Configurations without a positive execution time sort last. The fastest
/// configurations are marked when more than one configuration is compared.
/// Returns `None` for an empty slice.
pub fn create_performance_comparison_table(configs: &[ConfigurationInfo]) -> Option<PerformanceComparison> {
    if configs.is_empty() {
        return None;
    }

    let labels = display_labels(configs);
    let mut order: Vec<usize> = (0..configs.len()).collect();
    order.sort_by(|&a, &b| {
        compare_exec_times(configs[a].positive_exec_time(), configs[b].positive_exec_time())
    });

    let times: Vec<f64> = configs.iter().filter_map(|c| c.positive_exec_time()).collect();
    let fastest = times.iter().copied().reduce(f64::min);
    let slowest = times.iter().copied().reduce(f64::max);

    let rows = order
        .into_iter()
        .map(|i| {
            let config = &configs[i];
            let time = config.positive_exec_time();
            PerformanceRow {
                label: labels[i].clone(),
                exec_time: config.exec_time,
                jitter: config.jitter,
                runs: config.runs,
                fastest: configs.len() > 1 && time.is_some() && time == fastest,
            }
        })
        .collect();

    let delta = match (fastest, slowest) {
        (Some(fastest), Some(slowest)) if times.len() >= 2 => {
            let delta = slowest - fastest;
            Some(PerformanceDelta {
                fastest_time: fastest,
                slowest_time: slowest,
                delta,
                percentage: if fastest > 0.0 { delta / fastest * 100.0 } else { 0.0 },
            })
        }
        _ => None,
    };

    Some(PerformanceComparison { rows, delta })
}

/// Spread of one usage metric across configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaStats {
    /// `max_value - min_value`.
    pub delta: f64,
    /// Lowest average.
    pub min_value: f64,
    /// Highest average.
    pub max_value: f64,
    /// Label of the configuration with the lowest average.
    pub min_config: String,
    /// Label of the configuration with the highest average.
    pub max_config: String,
    /// Delta relative to the lowest average, in percent; 0 when that is not positive.
    pub percentage: f64,
}

/// Per-metric spread of the usage averages.
///
/// Only metrics reported by at least two configurations get an entry. On
/// ties, the first configuration in slice order wins both `min_config` and
/// `max_config`.
pub fn calculate_usage_deltas(configs: &[ConfigurationInfo]) -> BTreeMap<MetricType, DeltaStats> {
    let mut deltas = BTreeMap::new();
    if configs.len() < 2 {
        return deltas;
    }

    for metric in MetricType::ALL {
        let values: Vec<(&str, f64)> = configs
            .iter()
            .filter_map(|c| c.usage.get(&metric).map(|v| (c.config_label.as_str(), *v)))
            .collect();

        let Some((&first, rest)) = values.split_first() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let (mut min, mut max) = (first, first);
        for &(label, value) in rest {
            if value < min.1 {
                min = (label, value);
            }
            if value > max.1 {
                max = (label, value);
            }
        }

        let delta = max.1 - min.1;
        deltas.insert(
            metric,
            DeltaStats {
                delta,
                min_value: min.1,
                max_value: max.1,
                min_config: min.0.to_string(),
                max_config: max.0.to_string(),
                percentage: if min.1 > 0.0 { delta / min.1 * 100.0 } else { 0.0 },
            },
        );
    }

    deltas
}

fn comparison_headers(first: &str, labels: &[String], delta_column: bool) -> Vec<String> {
    let mut headers = vec![first.to_string()];
    headers.extend(labels.iter().cloned());
    if delta_column && labels.len() > 1 {
        headers.push(DELTA_LABEL.to_string());
    }
    headers
}

/// Average usage per metric, one column per configuration.
///
/// Missing averages render as `N/A`. With two or more values the lowest and
/// highest cells are marked and a delta column is filled. Returns `None` when
/// no configuration reports any usage.
pub fn create_average_usage_comparison_table(configs: &[ConfigurationInfo]) -> Option<Table> {
    if configs.is_empty() {
        return None;
    }

    let labels = display_labels(configs);
    let mut table = Table::new(
        "Average Resource Usage",
        comparison_headers("Metric", &labels, true),
    );

    for metric in MetricType::ALL {
        let values: Vec<Option<f64>> = configs.iter().map(|c| c.usage.get(&metric).copied()).collect();
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let (Some(min), Some(max)) = (
            present.iter().copied().reduce(f64::min),
            present.iter().copied().reduce(f64::max),
        ) else {
            continue;
        };

        let unit = metric.unit();
        let single = present.len() == 1;
        let mut cells: Vec<Cell> = values
            .iter()
            .map(|value| match value {
                None => Cell::new(NOT_AVAILABLE),
                Some(v) => {
                    let cell = Cell::new(format!("{v:.2} {unit}"));
                    if single {
                        cell
                    } else if *v == min {
                        cell.with_marker(Marker::Lowest)
                    } else if *v == max {
                        cell.with_marker(Marker::Highest)
                    } else {
                        cell
                    }
                }
            })
            .collect();

        if present.len() >= 2 {
            let delta = max - min;
            let percentage = if min > 0.0 { delta / min * 100.0 } else { 0.0 };
            cells.push(
                Cell::new(format!("{DELTA_SYMBOL} {delta:.2} {unit}"))
                    .with_note(format!("({percentage:.1}% difference)")),
            );
        } else if configs.len() > 1 {
            cells.push(Cell::new("-"));
        }

        table.push(Row::new(metric.label(), cells));
    }

    (!table.is_empty()).then_some(table)
}

fn differing_row<V>(name: &str, configs: &[ConfigurationInfo], value_of: V) -> Option<Row>
where
    V: Fn(&ConfigurationInfo) -> String,
{
    let values: Vec<String> = configs.iter().map(value_of).collect();
    let differs = values.iter().collect::<BTreeSet<_>>().len() > 1;
    differs.then(|| Row::new(name, values.into_iter().map(Cell::from).collect()))
}

/// Host properties that differ, one column per configuration.
pub fn create_system_differences_table(
    configs: &[ConfigurationInfo],
    different: &DifferentInfo,
) -> Option<Table> {
    if different.system.is_empty() {
        return None;
    }

    let labels = display_labels(configs);
    let mut table = Table::new(
        "Host System Differences",
        comparison_headers("System Property", &labels, false),
    );

    for field in SystemField::ALL {
        if !different.system.contains(&field) {
            continue;
        }
        if let Some(row) = differing_row(field.display_name(), configs, |c| system_value(c, field)) {
            table.push(row);
        }
    }

    (!table.is_empty()).then_some(table)
}

/// Engine properties that differ, one column per configuration.
pub fn create_engine_differences_table(
    configs: &[ConfigurationInfo],
    different: &DifferentInfo,
) -> Option<Table> {
    let labels = display_labels(configs);
    let mut table = Table::new(
        "Container Engine Differences",
        comparison_headers("Engine Property", &labels, false),
    );

    for field in [CommonField::ContainerEngineProvider, CommonField::ContainerEngine] {
        if different.common.contains(&field) {
            let values = configs.iter().map(|c| Cell::from(field.value_of(c))).collect();
            table.push(Row::new(field.display_name(), values));
        }
    }

    for field in EngineField::ALL {
        if !different.engine.contains(&field) {
            continue;
        }
        if let Some(row) = differing_row(field.display_name(), configs, |c| engine_value(c, field)) {
            table.push(row);
        }
    }

    (!table.is_empty()).then_some(table)
}

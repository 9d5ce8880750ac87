// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run aggregation.
//!
//! Turns the raw run records selected by a settings filter into
//! [`ConfigurationInfo`] summaries. Result payloads are semi-structured, so
//! every extraction here degrades to a default instead of failing: a missing
//! section yields an empty field, a run without metrics is skipped.

use crate::info::{
    ConfigurationInfo, EngineInfo, EnginePlatform, SystemInfo, SystemKind, NOT_AVAILABLE,
};
use crate::label::generate_config_label;
use crate::metrics::calculate_config_metrics;
use serde_json::Value;
use std::collections::BTreeMap;
use topsail_core::{display_value, RunMatrix, Settings};
use tracing::{debug, warn};

/// Path of the software overview in the system state.
pub const SOFTWARE_OVERVIEW_PATH: [&str; 2] = ["Software", "System Software Overview"];

/// Path of the hardware overview in the system state.
pub const HARDWARE_OVERVIEW_PATH: [&str; 2] = ["Hardware", "Hardware Overview"];

/// Path of the machine environment in the captured test configuration.
pub const MACHINE_ENV_PATH: [&str; 5] = ["yaml_file", "prepare", "podman", "machine", "env"];

/// Environment variable naming the machine provider.
pub const MACHINE_PROVIDER_VAR: &str = "CONTAINERS_MACHINE_PROVIDER";

/// Provider reported for docker on Windows hosts.
pub const DOCKER_WINDOWS_PROVIDER: &str = "wsl";

/// Provider reported for docker everywhere else.
pub const DOCKER_DEFAULT_PROVIDER: &str = "N/A (Docker)";

/// Group of runs without a `benchmark` setting.
pub const UNKNOWN_BENCHMARK: &str = "unknown";

/// Settings dropped before a combination is looked up.
pub const IGNORED_SETTINGS: [&str; 2] = ["stats", "test_mac_ai"];

/// Configurations grouped by benchmark name.
pub type ConfigurationsByBenchmark = BTreeMap<String, Vec<ConfigurationInfo>>;

/// Walk `path` through nested objects.
///
/// Returns `None` as soon as a level is missing or is not an object.
pub fn safe_nested_get<'a>(data: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(data, |current, key| current.as_object()?.get(*key))
}

/// Scalars as display strings; anything else, or nothing, as `""`.
fn scalar_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn field(section: Option<&Value>, key: &str) -> String {
    scalar_string(section.and_then(|s| s.get(key)))
}

/// Host description from a system state artifact.
pub fn extract_system_info(system_state: &Value) -> SystemInfo {
    let software = safe_nested_get(system_state, &SOFTWARE_OVERVIEW_PATH);
    let hardware = safe_nested_get(system_state, &HARDWARE_OVERVIEW_PATH);

    let mut info = SystemInfo {
        os_version: field(software, "System Version"),
        kernel_version: field(software, "Kernel Version"),
        cpu_model: field(hardware, "Chip"),
        cpu_cores: field(hardware, "Total Number of Cores"),
        memory: field(hardware, "Memory"),
        model_id: field(hardware, "Model Identifier"),
        architecture: field(hardware, "Architecture"),
    };

    // Apple chips do not report an architecture.
    if info.cpu_model.contains("Apple") {
        info.architecture = "Arm64".to_string();
    }

    info
}

/// Engine description from `podman info` output.
pub fn extract_podman_engine_info(engine_info: &Value, is_linux: bool) -> EngineInfo {
    let host = safe_nested_get(engine_info, &["host"]);

    EngineInfo {
        platform: EnginePlatform::Podman,
        client_version: (!is_linux).then(|| field(safe_nested_get(engine_info, &["Client"]), "Version")),
        host_version: field(safe_nested_get(engine_info, &["version"]), "Version"),
        mode: Some(field(safe_nested_get(engine_info, &["host", "security"]), "rootless")),
        runtime: field(safe_nested_get(engine_info, &["host", "ociRuntime"]), "name"),
        host_cpu: field(host, "cpus"),
        host_memory: field(host, "memTotal"),
        host_kernel: field(host, "kernel"),
    }
}

/// Engine description from `docker info` output.
pub fn extract_docker_engine_info(engine_info: &Value, is_linux: bool) -> EngineInfo {
    let root = Some(engine_info);

    EngineInfo {
        platform: EnginePlatform::Docker,
        client_version: (!is_linux)
            .then(|| field(safe_nested_get(engine_info, &["ClientInfo"]), "Version")),
        host_version: field(root, "ServerVersion"),
        mode: None,
        runtime: field(root, "DefaultRuntime"),
        host_cpu: field(root, "NCPU"),
        host_memory: field(root, "MemTotal"),
        host_kernel: field(root, "KernelVersion"),
    }
}

/// Machine provider recorded in the run's test configuration.
pub fn extract_container_engine_provider(test_config: &Value) -> String {
    field(safe_nested_get(test_config, &MACHINE_ENV_PATH), MACHINE_PROVIDER_VAR)
}

fn is_empty_section(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Summary of the runs selected by `filter`.
///
/// Runs without a metrics section are skipped with a warning. When several
/// runs match, later runs overwrite earlier ones. Returns `None` when no
/// selected run has metrics.
pub fn get_info(matrix: &RunMatrix, filter: &Settings) -> Option<ConfigurationInfo> {
    let mut info: Option<ConfigurationInfo> = None;

    for record in matrix.filter_records(filter) {
        let Some(metrics) = &record.results.metrics else {
            warn!(location = ?record.location, "run has no metrics, skipping");
            continue;
        };

        let entry = info.get_or_insert_with(ConfigurationInfo::default);
        entry.exec_time = metrics.execution_time_95th_percentile;
        entry.jitter = metrics.execution_time_jitter;
        entry.command = metrics.command.as_ref().map(display_value);
        entry.timestamp = metrics.timestamp.as_ref().map(display_value);
        entry.runs = record
            .settings
            .get("benchmark_runs")
            .and_then(Value::as_u64)
            .unwrap_or(1);

        entry.container_engine_provider = match &record.results.test_config {
            Some(test_config) if !is_empty_section(test_config) => {
                Some(extract_container_engine_provider(test_config))
            }
            _ => {
                warn!(location = ?record.location, "run has no test_config");
                Some(String::new())
            }
        };

        let mut is_linux = false;
        if let Some(state) = record.results.system_state.as_ref().filter(|s| !is_empty_section(s)) {
            let system = extract_system_info(state);
            is_linux = system.kind() == SystemKind::Linux;
            entry.system = Some(system);
        }

        if let Some(engine_info) = record
            .results
            .container_engine_info
            .as_ref()
            .filter(|e| !is_empty_section(e))
        {
            entry.container_engine_full = Some(engine_info.clone());

            let platform = record.settings.get_str("container_engine");
            match platform.and_then(EnginePlatform::parse) {
                Some(EnginePlatform::Podman) => {
                    entry.container_engine_info = Some(extract_podman_engine_info(engine_info, is_linux));
                }
                Some(EnginePlatform::Docker) => {
                    let on_windows = entry
                        .system
                        .as_ref()
                        .map_or(false, |s| s.kind() == SystemKind::Windows);
                    let provider = if on_windows {
                        DOCKER_WINDOWS_PROVIDER
                    } else {
                        DOCKER_DEFAULT_PROVIDER
                    };
                    entry.container_engine_provider = Some(provider.to_string());
                    entry.container_engine_info = Some(extract_docker_engine_info(engine_info, is_linux));
                }
                None => {
                    debug!(platform = platform.unwrap_or(NOT_AVAILABLE), "unsupported container engine");
                }
            }
        }

        if is_linux {
            entry.container_engine_provider = None;
        }
    }

    let mut info = info?;
    info.settings = filter.without_wildcards();
    info.config_label = generate_config_label(&info.settings, true);
    info.usage = calculate_config_metrics(matrix, filter);
    Some(info)
}

/// Every combination of the varying settings, in key order.
fn setting_combinations(varying: &BTreeMap<String, Vec<Value>>) -> Vec<Settings> {
    varying.iter().fold(vec![Settings::new()], |combinations, (key, values)| {
        combinations
            .iter()
            .flat_map(|base| {
                values
                    .iter()
                    .map(move |value| base.clone().with(key.clone(), value.clone()))
            })
            .collect()
    })
}

/// Summaries of every settings combination in the matrix, grouped by
/// benchmark.
///
/// The varying settings of the matrix are expanded into their cartesian
/// product and overlaid with `static_settings`. Combinations without any
/// run are dropped.
pub fn get_all_configuration_info(matrix: &RunMatrix, static_settings: &Settings) -> ConfigurationsByBenchmark {
    let static_settings = static_settings.without_wildcards();
    let mut by_benchmark = ConfigurationsByBenchmark::new();

    for mut settings in setting_combinations(&matrix.varying_settings()) {
        settings.extend(&static_settings);
        for key in IGNORED_SETTINGS {
            settings.remove(key);
        }

        let Some(mut info) = get_info(matrix, &settings) else {
            continue;
        };
        let settings = settings.without_absent();

        let benchmark = settings
            .get_str("benchmark")
            .unwrap_or(UNKNOWN_BENCHMARK)
            .to_string();
        info.config_label = generate_config_label(&settings, true);
        info.settings = settings;

        by_benchmark.entry(benchmark).or_default().push(info);
    }

    debug!(benchmarks = by_benchmark.len(), "aggregated configurations");
    by_benchmark
}

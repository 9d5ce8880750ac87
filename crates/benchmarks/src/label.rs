// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration labels.

use crate::info::{ConfigurationInfo, EngineField, SystemKind, NOT_AVAILABLE};
use crate::units::human_readable_size;
use std::collections::BTreeSet;
use topsail_core::{display_value, Settings, ANY_VALUE};

/// Label used when nothing distinguishes a configuration.
pub const DEFAULT_LABEL: &str = "Configuration";

/// Separator between label fragments.
pub const LABEL_SEPARATOR: &str = " | ";

/// Settings never shown as label fragments in display labels.
pub const CONFIGURATION_EXCLUDED_KEYS: [&str; 10] = [
    "container_engine",
    "benchmark",
    "benchmark_runs",
    "stats",
    "test_mac_ai",
    "platform",
    "repo_version",
    "test.podman.machine_provider",
    "test.podman.repo_version",
    "test.docker.repo_version",
];

/// Shorten a setting key: drop the engine test prefix and keep the last
/// dotted segment.
pub fn normalize_configuration_key(key: &str) -> String {
    let key = key.replace("test.podman.", "").replace("test.docker.", "");
    match key.rsplit_once('.') {
        Some((_, last)) => last.to_string(),
        None => key,
    }
}

/// `fio_seq_read` becomes `Fio Seq Read`.
pub fn format_benchmark_title(benchmark: &str) -> String {
    benchmark
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Render an engine field value for display.
///
/// `Host_memory` byte counts become human-readable sizes; anything else is
/// returned as is.
pub fn format_field_value(field: EngineField, value: &str) -> String {
    if field == EngineField::HostMemory && value != NOT_AVAILABLE {
        if let Ok(bytes) = value.trim().parse::<u64>() {
            return human_readable_size(bytes);
        }
    }
    value.to_string()
}

fn is_shown(value: &serde_json::Value) -> bool {
    !value.is_null() && value.as_str() != Some(ANY_VALUE)
}

fn is_known(value: &str) -> bool {
    !value.is_empty() && value != NOT_AVAILABLE && value != "false"
}

/// Full label of a settings combination: engine, benchmark title and every
/// other setting as `key: value`, sorted by key.
pub fn generate_config_label(settings: &Settings, exclude_benchmark: bool) -> String {
    let mut parts = Vec::new();

    if let Some(engine) = settings.get("container_engine") {
        parts.push(display_value(engine));
    }

    if !exclude_benchmark {
        if let Some(benchmark) = settings.get("benchmark") {
            parts.push(format_benchmark_title(&display_value(benchmark)));
        }
    }

    for (key, value) in settings.iter() {
        if key == "container_engine" || key == "benchmark" || !is_shown(value) {
            continue;
        }
        parts.push(format!(
            "{}: {}",
            normalize_configuration_key(key),
            display_value(value)
        ));
    }

    join_label(parts)
}

/// Compact label of `config` within the set of compared configurations.
///
/// Besides the engine, only the fragments that vary across `all` are shown:
/// machine provider, engine properties and settings. A configuration compared
/// with nothing else shows its provider, if known.
pub fn generate_display_config_label(config: &ConfigurationInfo, all: &[ConfigurationInfo]) -> String {
    let mut parts = Vec::new();

    if let Some(engine) = config.settings.get("container_engine") {
        parts.push(display_value(engine));
    }

    if all.len() > 1 {
        push_provider_if_varying(&mut parts, config, all);
        push_engine_fields_if_varying(&mut parts, config, all);
        push_settings_if_varying(&mut parts, config, all);
    } else if let Some(provider) = config.container_engine_provider.as_deref().filter(|p| is_known(p)) {
        parts.push(format!("Provider: {provider}"));
    }

    join_label(parts)
}

fn join_label(parts: Vec<String>) -> String {
    if parts.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        parts.join(LABEL_SEPARATOR)
    }
}

fn push_provider_if_varying(parts: &mut Vec<String>, config: &ConfigurationInfo, all: &[ConfigurationInfo]) {
    let Some(provider) = config.container_engine_provider.as_deref().filter(|p| is_known(p)) else {
        return;
    };

    let providers: BTreeSet<&str> = all
        .iter()
        .filter_map(|c| c.container_engine_provider.as_deref())
        .filter(|p| is_known(p))
        .collect();

    if providers.len() > 1 {
        parts.push(format!("Provider: {provider}"));
    }
}

fn push_engine_fields_if_varying(
    parts: &mut Vec<String>,
    config: &ConfigurationInfo,
    all: &[ConfigurationInfo],
) {
    let Some(engine) = &config.container_engine_info else {
        return;
    };

    for field in EngineField::ALL {
        let Some(value) = engine.get(field).filter(|v| is_known(v)) else {
            continue;
        };

        let values: BTreeSet<String> = all
            .iter()
            .filter_map(|c| c.container_engine_info.as_ref())
            .filter_map(|e| e.get(field))
            .filter(|v| is_known(v))
            .map(|v| format_field_value(field, v))
            .collect();

        if values.len() <= 1 {
            continue;
        }

        let name = match field {
            EngineField::HostVersion
                if config.system.as_ref().map(|s| s.kind()) == Some(SystemKind::Linux) =>
            {
                "Version"
            }
            _ => field.label_name(),
        };
        parts.push(format!("{name}: {}", format_field_value(field, value)));
    }
}

fn push_settings_if_varying(parts: &mut Vec<String>, config: &ConfigurationInfo, all: &[ConfigurationInfo]) {
    for (key, value) in config.settings.iter() {
        if CONFIGURATION_EXCLUDED_KEYS.contains(&key.as_str()) || !is_shown(value) {
            continue;
        }

        let values: BTreeSet<String> = all
            .iter()
            .filter_map(|c| c.settings.get(key))
            .filter(|v| is_shown(v))
            .map(display_value)
            .collect();

        if values.len() > 1 {
            parts.push(format!(
                "{}: {}",
                normalize_configuration_key(key),
                display_value(value)
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{EngineInfo, EnginePlatform, SystemInfo};

    fn engine(version: &str) -> EngineInfo {
        EngineInfo {
            platform: EnginePlatform::Podman,
            client_version: None,
            host_version: version.into(),
            mode: Some("true".into()),
            runtime: "crun".into(),
            host_cpu: "4".into(),
            host_memory: "4294967296".into(),
            host_kernel: "6.9".into(),
        }
    }

    fn config(engine_name: &str, version: &str, settings: Settings) -> ConfigurationInfo {
        ConfigurationInfo {
            settings: settings.with("container_engine", engine_name),
            container_engine_info: Some(engine(version)),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_configuration_key() {
        assert_eq!(normalize_configuration_key("test.podman.machine_provider"), "machine_provider");
        assert_eq!(normalize_configuration_key("test.docker.a.b.cpus"), "cpus");
        assert_eq!(normalize_configuration_key("concurrency"), "concurrency");
    }

    #[test]
    fn test_format_benchmark_title() {
        assert_eq!(format_benchmark_title("fio_seq_read"), "Fio Seq Read");
        assert_eq!(format_benchmark_title("iperf"), "Iperf");
    }

    #[test]
    fn test_format_field_value() {
        assert_eq!(format_field_value(EngineField::HostMemory, "4294967296"), "4.0 GiB");
        assert_eq!(format_field_value(EngineField::HostMemory, "N/A"), "N/A");
        assert_eq!(format_field_value(EngineField::HostMemory, "lots"), "lots");
        assert_eq!(format_field_value(EngineField::HostCpu, "4294967296"), "4294967296");
    }

    #[test]
    fn test_generate_config_label() {
        let settings = Settings::new()
            .with("container_engine", "podman")
            .with("benchmark", "fio_seq")
            .with("test.podman.machine_provider", "applehv")
            .with("concurrency", 4)
            .with("stats", ANY_VALUE)
            .with("unset", serde_json::Value::Null);

        assert_eq!(
            generate_config_label(&settings, false),
            "podman | Fio Seq | concurrency: 4 | machine_provider: applehv"
        );
        assert_eq!(
            generate_config_label(&settings, true),
            "podman | concurrency: 4 | machine_provider: applehv"
        );
        assert_eq!(generate_config_label(&Settings::new(), false), DEFAULT_LABEL);
    }

    #[test]
    fn test_display_label_shows_only_varying_fragments() {
        let all = vec![
            config("podman", "5.2", Settings::new().with("concurrency", 1).with("repo_version", "a")),
            config("podman", "5.3", Settings::new().with("concurrency", 1).with("repo_version", "b")),
        ];

        assert_eq!(generate_display_config_label(&all[0], &all), "podman | Host: 5.2");
        assert_eq!(generate_display_config_label(&all[1], &all), "podman | Host: 5.3");
    }

    #[test]
    fn test_display_label_linux_host_version() {
        let mut all = vec![
            config("podman", "5.2", Settings::new()),
            config("podman", "5.3", Settings::new()),
        ];
        for c in &mut all {
            c.system = Some(SystemInfo {
                os_version: "Fedora Linux 40".into(),
                ..Default::default()
            });
        }

        assert_eq!(generate_display_config_label(&all[0], &all), "podman | Version: 5.2");
    }

    #[test]
    fn test_display_label_single_configuration() {
        let mut single = config("docker", "27.0", Settings::new().with("concurrency", 8));
        single.container_engine_provider = Some("wsl".into());
        assert_eq!(
            generate_display_config_label(&single, std::slice::from_ref(&single)),
            "docker | Provider: wsl"
        );

        single.container_engine_provider = Some(NOT_AVAILABLE.into());
        assert_eq!(generate_display_config_label(&single, &[]), "docker");
    }

    #[test]
    fn test_display_label_skips_false_mode() {
        let mut all = vec![
            config("podman", "5.2", Settings::new()),
            config("podman", "5.2", Settings::new()),
        ];
        if let Some(engine) = all[1].container_engine_info.as_mut() {
            engine.mode = Some("false".into());
        }

        assert_eq!(generate_display_config_label(&all[0], &all), "podman");
        assert_eq!(generate_display_config_label(&all[1], &all), "podman");
    }

    #[test]
    fn test_display_label_varying_settings() {
        let all = vec![
            config("podman", "5.2", Settings::new().with("concurrency", 1)),
            config("docker", "5.2", Settings::new().with("concurrency", 8)),
        ];
        assert_eq!(generate_display_config_label(&all[1], &all), "docker | concurrency: 8");
    }
}

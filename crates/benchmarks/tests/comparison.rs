// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

use serde_json::json;
use std::fs;
use tempfile::TempDir;
use topsail_benchmarks::{
    create_average_usage_comparison_table, create_performance_comparison_table,
    find_shared_and_different_info, generate_comparison_report, get_all_configuration_info,
    get_info, io, markdown, CommonField, Marker, MetricType, OutputFormat,
};
use topsail_core::{BenchmarkMetrics, RunMatrix, RunRecord};

fn fio_run(engine: &str, exec_time: f64, command: &str) -> RunRecord {
    let metrics: BenchmarkMetrics = serde_json::from_value(json!({
        "execution_time_95th_percentile": exec_time,
        "execution_time_jitter": 0.25,
        "command": command,
        "timestamp": "2025-06-01 10:00:00",
        "interval": 1.0,
        "cpu": [20.0, 40.0],
        "memory": [50.0],
    }))
    .unwrap();

    RunRecord::builder()
        .setting("container_engine", engine)
        .setting("benchmark", "fio")
        .setting("benchmark_runs", 3)
        .metrics(metrics)
        .build()
        .unwrap()
}

#[test]
fn test_fio_podman_versus_docker() {
    let matrix: RunMatrix = vec![
        fio_run("podman", 12.0, "fio --rw=read"),
        fio_run("docker", 9.0, "fio --rw=read"),
    ]
    .into();

    let grouped = get_all_configuration_info(&matrix, &matrix.static_settings());
    let fio = &grouped["fio"];
    assert_eq!(fio.len(), 2);
    assert!(fio.iter().all(|c| c.runs == 3));

    let table = create_performance_comparison_table(fio).unwrap();
    let rows: Vec<(&str, Option<f64>, bool)> = table
        .rows
        .iter()
        .map(|r| (r.label.as_str(), r.exec_time, r.fastest))
        .collect();
    assert_eq!(
        rows,
        vec![("docker", Some(9.0), true), ("podman", Some(12.0), false)]
    );

    let delta = table.delta.unwrap();
    assert_eq!(delta.display(), "Δ 3.00s (33.3% difference)");

    let rendered = table.to_table();
    assert_eq!(rendered.rows[0].cells[0].marker, Some(Marker::Fastest));
    assert_eq!(rendered.rows[0].cells[0].note.as_deref(), Some("(Average of 3 runs)"));
    assert_eq!(rendered.rows[2].cells[0].display(), "Δ 3.00s (33.3% difference)");
}

#[test]
fn test_shared_engine_different_command() {
    let matrix: RunMatrix = vec![
        fio_run("podman", 1.0, "fio --bs=4k"),
        fio_run("podman", 2.0, "fio --bs=64k"),
        fio_run("podman", 3.0, "fio --bs=1m"),
    ]
    .into();
    let configs: Vec<_> = matrix
        .records()
        .iter()
        .map(|record| {
            let single: RunMatrix = vec![record.clone()].into();
            get_info(&single, &record.settings).unwrap()
        })
        .collect();

    let (shared, different) = find_shared_and_different_info(&configs);
    assert_eq!(shared.common[&CommonField::ContainerEngine], "podman");
    assert_eq!(shared.common[&CommonField::Runs], "3");
    assert!(different.common.contains(&CommonField::Command));
    assert!(!shared.common.contains_key(&CommonField::Command));
}

#[test]
fn test_missing_disk_usage_renders_not_available() {
    let with_disk: BenchmarkMetrics = serde_json::from_value(json!({
        "execution_time_95th_percentile": 4.0,
        "cpu": [10.0],
        "memory": [20.0],
        "disk": {"read": [1048576.0, 3145728.0], "write": [0.0]},
    }))
    .unwrap();
    let without_disk: BenchmarkMetrics = serde_json::from_value(json!({
        "execution_time_95th_percentile": 5.0,
        "cpu": [30.0],
        "memory": [40.0],
    }))
    .unwrap();

    let matrix: RunMatrix = vec![
        RunRecord::builder()
            .setting("container_engine", "podman")
            .setting("benchmark", "fio")
            .metrics(with_disk)
            .build()
            .unwrap(),
        RunRecord::builder()
            .setting("container_engine", "docker")
            .setting("benchmark", "fio")
            .metrics(without_disk)
            .build()
            .unwrap(),
    ]
    .into();

    let grouped = get_all_configuration_info(&matrix, &matrix.static_settings());
    let fio = &grouped["fio"];
    let docker = fio.iter().find(|c| c.container_engine() == Some("docker")).unwrap();
    assert_eq!(docker.usage.get(&MetricType::Cpu), Some(&30.0));
    assert_eq!(docker.usage.get(&MetricType::Memory), Some(&40.0));
    assert!(!docker.usage.contains_key(&MetricType::DiskRead));
    assert!(!docker.usage.contains_key(&MetricType::DiskWrite));

    let table = create_average_usage_comparison_table(fio).unwrap();
    let disk_read = table.row("Average Disk Read").unwrap();
    let texts: Vec<&str> = disk_read.cells.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["2.00 MB/s", "N/A", "-"]);
}

#[test]
fn test_report_from_run_directories() {
    let temp = TempDir::new().unwrap();
    for (name, engine, time) in [("run-1", "podman", 12.0), ("run-2", "docker", 9.0)] {
        let dir = temp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(io::SETTINGS_FILE),
            format!("container_engine: {engine}\nbenchmark: fio_seq\n"),
        )
        .unwrap();
        fs::write(
            dir.join(io::RESULTS_FILE),
            json!({"metrics": {"execution_time_95th_percentile": time}}).to_string(),
        )
        .unwrap();
    }

    let matrix = io::load_records(temp.path()).unwrap();
    let report = generate_comparison_report(&get_all_configuration_info(&matrix, &matrix.static_settings()));
    let fio = report.benchmark("fio_seq").unwrap();
    assert_eq!(fio.title, "Fio Seq");

    let text = markdown::generate_report(&report);
    assert!(text.contains("## Benchmark: Fio Seq"));
    assert!(text.contains("| docker | 9.00s (Average of 1 runs) ⚡ FASTEST |"));
    assert!(text.contains("| Performance Delta | Δ 3.00s (33.3% difference) |"));

    let written = io::write_report(&report, temp.path().join("report"), OutputFormat::Json).unwrap();
    assert_eq!(written.len(), 1);
}

#[test]
fn test_engine_specific_settings_keep_every_engine() {
    let mut podman = fio_run("podman", 12.0, "fio --rw=read");
    podman.settings.insert("test.podman.repo_version", "5.2");
    let mut docker = fio_run("docker", 9.0, "fio --rw=read");
    docker.settings.insert("test.docker.repo_version", "27.1");
    let matrix: RunMatrix = vec![podman, docker].into();

    let grouped = get_all_configuration_info(&matrix, &matrix.static_settings());
    let fio = &grouped["fio"];
    let mut engines: Vec<&str> = fio.iter().filter_map(|c| c.container_engine()).collect();
    engines.sort_unstable();
    assert_eq!(engines, vec!["docker", "podman"]);

    let podman = fio.iter().find(|c| c.container_engine() == Some("podman")).unwrap();
    assert_eq!(podman.settings.get_str("test.podman.repo_version"), Some("5.2"));
    assert!(!podman.settings.contains_key("test.docker.repo_version"));

    let table = create_performance_comparison_table(fio).unwrap();
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.delta.unwrap().display(), "Δ 3.00s (33.3% difference)");
}

#[test]
fn test_numeric_timestamp_is_loaded() {
    let temp = TempDir::new().unwrap();
    let runs = [
        ("run-1", "podman", json!({"execution_time_95th_percentile": 9.0, "command": "", "timestamp": 0})),
        ("run-2", "docker", json!({"execution_time_95th_percentile": 8.0, "command": 42, "timestamp": "2025-06-01"})),
    ];
    for (name, engine, metrics) in runs {
        let dir = temp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(io::SETTINGS_FILE),
            format!("container_engine: {engine}\nbenchmark: fio\n"),
        )
        .unwrap();
        fs::write(dir.join(io::RESULTS_FILE), json!({"metrics": metrics}).to_string()).unwrap();
    }

    let matrix = io::load_records(temp.path()).unwrap();
    assert_eq!(matrix.len(), 2);

    let grouped = get_all_configuration_info(&matrix, &matrix.static_settings());
    let fio = &grouped["fio"];
    let podman = fio.iter().find(|c| c.container_engine() == Some("podman")).unwrap();
    assert_eq!(podman.timestamp.as_deref(), Some("0"));
    assert_eq!(podman.command.as_deref(), Some(""));
    let docker = fio.iter().find(|c| c.container_engine() == Some("docker")).unwrap();
    assert_eq!(docker.timestamp.as_deref(), Some("2025-06-01"));
    assert_eq!(docker.command.as_deref(), Some("42"));
}

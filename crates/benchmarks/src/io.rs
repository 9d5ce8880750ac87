// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! I/O operations for run records and comparison reports.
//!
//! Records are read either from one JSON file holding an array of records,
//! or from a directory tree where every run directory holds a
//! `settings.yaml` and a `results.json`.

use crate::error::{Error, Result};
use crate::markdown;
use crate::report::ComparisonReport;
use std::fs;
use std::path::{Path, PathBuf};
use topsail_core::{RunMatrix, RunRecord, RunResults, Settings};
use tracing::{debug, info, warn};

/// Settings file of a run directory.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Results file of a run directory.
pub const RESULTS_FILE: &str = "results.json";

/// JSON report file name.
pub const REPORT_JSON_FILE: &str = "comparison_report.json";

/// Markdown report file name.
pub const REPORT_MARKDOWN_FILE: &str = "comparison_report.md";

/// Report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown only
    Markdown,
    /// JSON only
    Json,
    /// Both
    Both,
}

impl OutputFormat {
    fn markdown(&self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }

    fn json(&self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

/// Load run records from a JSON file or a run directory tree.
pub fn load_records(path: impl AsRef<Path>) -> Result<RunMatrix> {
    let path = path.as_ref();
    let matrix = if path.is_dir() {
        read_records_dir(path)?
    } else {
        read_records_json(path)?
    };
    info!(path = %path.display(), records = matrix.len(), "loaded run records");
    Ok(matrix)
}

/// Read records from a JSON array file.
pub fn read_records_json(path: impl AsRef<Path>) -> Result<RunMatrix> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let records: Vec<RunRecord> = serde_json::from_str(&content)?;

    Ok(records
        .into_iter()
        .map(|mut record| {
            if record.location.is_none() {
                record.location = Some(path.display().to_string());
            }
            record
        })
        .collect())
}

/// Read records from a directory tree, one record per directory holding a
/// settings file. Directories are visited in name order.
pub fn read_records_dir(root: impl AsRef<Path>) -> Result<RunMatrix> {
    let mut run_dirs = Vec::new();
    collect_run_dirs(root.as_ref(), &mut run_dirs)?;

    run_dirs.iter().map(|dir| read_run_dir(dir)).collect()
}

fn collect_run_dirs(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    if dir.join(SETTINGS_FILE).is_file() {
        found.push(dir.to_path_buf());
    }

    let mut children: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    children.sort();

    for child in children {
        collect_run_dirs(&child, found)?;
    }
    Ok(())
}

/// Read one run directory.
pub fn read_run_dir(dir: impl AsRef<Path>) -> Result<RunRecord> {
    let dir = dir.as_ref();

    let settings_path = dir.join(SETTINGS_FILE);
    let content = fs::read_to_string(&settings_path).map_err(|e| Error::io(&settings_path, e))?;
    let settings: Settings = serde_yaml::from_str(&content)?;

    let results_path = dir.join(RESULTS_FILE);
    let results: RunResults = if results_path.is_file() {
        let content = fs::read_to_string(&results_path).map_err(|e| Error::io(&results_path, e))?;
        serde_json::from_str(&content)?
    } else {
        warn!(path = %dir.display(), "run directory has no {RESULTS_FILE}");
        RunResults::default()
    };

    let mut record = RunRecord::builder()
        .settings(settings)
        .location(dir.display().to_string())
        .build()
        .map_err(|e| Error::invalid_record(dir, e.to_string()))?;
    record.results = results;

    debug!(path = %dir.display(), "loaded run directory");
    Ok(record)
}

/// Write the report as pretty JSON.
pub fn write_report_json(report: &ComparisonReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).map_err(|e| Error::io(path, e))
}

/// Write the report as markdown.
pub fn write_report_markdown(report: &ComparisonReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, markdown::generate_report(report)).map_err(|e| Error::io(path, e))
}

/// Write the report into `dir` in the requested formats.
///
/// Returns the paths written.
pub fn write_report(
    report: &ComparisonReport,
    dir: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut written = Vec::new();
    if format.markdown() {
        let path = dir.join(REPORT_MARKDOWN_FILE);
        write_report_markdown(report, &path)?;
        written.push(path);
    }
    if format.json() {
        let path = dir.join(REPORT_JSON_FILE);
        write_report_json(report, &path)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "report written");
    Ok(written)
}

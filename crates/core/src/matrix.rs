// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! The universe of recorded runs.

use crate::record::RunRecord;
use crate::settings::Settings;
use serde_json::Value;
use std::collections::BTreeMap;

/// All the runs of a benchmark campaign.
#[derive(Debug, Clone, Default)]
pub struct RunMatrix {
    records: Vec<RunRecord>,
}

impl RunMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record.
    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the matrix holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records selected by the settings filter, in insertion order.
    pub fn filter_records<'a>(
        &'a self,
        filter: &'a Settings,
    ) -> impl Iterator<Item = &'a RunRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| filter.matches(&record.settings))
    }

    /// Every setting key mapped to its distinct values, in first-seen order.
    pub fn setting_values(&self) -> BTreeMap<String, Vec<Value>> {
        let mut values: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for record in &self.records {
            for (key, value) in record.settings.iter() {
                let seen = values.entry(key.clone()).or_default();
                if !seen.contains(value) {
                    seen.push(value.clone());
                }
            }
        }
        values
    }

    /// Settings taking more than one value across the matrix.
    ///
    /// A key missing from some records gets an extra `null` value, which
    /// selects those records when used in a filter.
    pub fn varying_settings(&self) -> BTreeMap<String, Vec<Value>> {
        self.setting_values()
            .into_iter()
            .filter_map(|(key, mut values)| {
                if !self.is_shared(&key) && !values.contains(&Value::Null) {
                    values.push(Value::Null);
                }
                (values.len() > 1).then_some((key, values))
            })
            .collect()
    }

    /// Settings present in every record with a single value.
    pub fn static_settings(&self) -> Settings {
        self.setting_values()
            .into_iter()
            .filter(|(key, values)| values.len() == 1 && self.is_shared(key))
            .filter_map(|(key, mut values)| values.pop().map(|v| (key, v)))
            .collect()
    }

    fn is_shared(&self, key: &str) -> bool {
        self.records.iter().all(|record| record.settings.contains_key(key))
    }
}

impl FromIterator<RunRecord> for RunMatrix {
    fn from_iter<I: IntoIterator<Item = RunRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<RunRecord>> for RunMatrix {
    fn from(records: Vec<RunRecord>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(benchmark: &str, engine: &str) -> RunRecord {
        RunRecord::builder()
            .setting("benchmark", benchmark)
            .setting("container_engine", engine)
            .setting("platform", "mac")
            .build()
            .unwrap()
    }

    fn matrix() -> RunMatrix {
        vec![
            record("fio", "podman"),
            record("fio", "docker"),
            record("iperf", "podman"),
        ]
        .into()
    }

    #[test]
    fn test_filter_records() {
        let matrix = matrix();
        let filter = Settings::new().with("benchmark", "fio");
        assert_eq!(matrix.filter_records(&filter).count(), 2);

        let filter = filter.with("container_engine", "docker");
        let selected: Vec<_> = matrix.filter_records(&filter).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].settings.get_str("container_engine"), Some("docker"));
    }

    #[test]
    fn test_varying_and_static_settings() {
        let matrix = matrix();

        let varying = matrix.varying_settings();
        assert_eq!(varying.len(), 2);
        assert_eq!(varying["benchmark"], vec![json!("fio"), json!("iperf")]);
        assert_eq!(varying["container_engine"], vec![json!("podman"), json!("docker")]);

        let fixed = matrix.static_settings();
        assert_eq!(fixed.get_str("platform"), Some("mac"));
        assert_eq!(fixed.len(), 1);
    }

    #[test]
    fn test_engine_specific_keys_are_not_static() {
        let podman = RunRecord::builder()
            .setting("container_engine", "podman")
            .setting("platform", "mac")
            .setting("test.podman.repo_version", "5.2")
            .build()
            .unwrap();
        let docker = RunRecord::builder()
            .setting("container_engine", "docker")
            .setting("platform", "mac")
            .setting("test.docker.repo_version", "27.1")
            .build()
            .unwrap();
        let matrix: RunMatrix = vec![podman, docker].into();

        let fixed = matrix.static_settings();
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed.get_str("platform"), Some("mac"));

        let varying = matrix.varying_settings();
        assert_eq!(varying["test.podman.repo_version"], vec![json!("5.2"), Value::Null]);
        assert_eq!(varying["test.docker.repo_version"], vec![json!("27.1"), Value::Null]);

        let docker_only = Settings::new()
            .with("container_engine", "docker")
            .with("test.podman.repo_version", Value::Null)
            .with("test.docker.repo_version", "27.1");
        assert_eq!(matrix.filter_records(&docker_only).count(), 1);
    }
}

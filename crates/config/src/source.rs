// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Where configuration documents come from.
//!
//! Documents are addressed by logical name. [`DirectorySource`] maps a name
//! to `<root>/<name>.yaml`; [`MappingSource`] serves the top-level entries of
//! a single YAML file (the test-templates layout).

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const YAML_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Source of named configuration documents.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentSource {
    /// Load the document with the given name, `None` when it does not exist.
    fn load(&self, name: &str) -> Result<Option<Value>>;

    /// Names of all available documents, sorted.
    fn names(&self) -> Result<Vec<String>>;
}

/// One YAML file per document in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Serve documents from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory documents are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSource for DirectorySource {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        for ext in YAML_EXTENSIONS {
            let path = self.root.join(format!("{name}.{ext}"));
            if !path.is_file() {
                continue;
            }

            debug!(path = %path.display(), "loading configuration document");
            let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            return Ok(Some(serde_yaml::from_str(&content)?));
        }

        Ok(None)
    }

    fn names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&self.root, e))?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| YAML_EXTENSIONS.contains(&ext));
            if !is_yaml {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Documents stored as the top-level entries of one mapping.
#[derive(Debug, Clone, Default)]
pub struct MappingSource {
    documents: Mapping,
}

impl MappingSource {
    /// Serve the entries of `documents`.
    pub fn new(documents: Mapping) -> Self {
        Self { documents }
    }

    /// Parse a YAML string whose top level maps names to documents.
    pub fn from_yaml(content: &str) -> Result<Self> {
        match serde_yaml::from_str(content)? {
            Value::Mapping(documents) => Ok(Self::new(documents)),
            Value::Null => Ok(Self::default()),
            _ => Err(Error::NotAMapping("<document file>".to_string())),
        }
    }

    /// Read a YAML file whose top level maps names to documents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Add or replace a document.
    pub fn insert(&mut self, name: impl Into<String>, document: Value) {
        self.documents.insert(Value::String(name.into()), document);
    }
}

impl DocumentSource for MappingSource {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.documents.get(name).cloned())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .documents
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_source_loads_by_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("flan-t5.yaml"), "serving:\n  replicas: 1\n").unwrap();
        fs::write(dir.path().join("base.yml"), "x: 1\n").unwrap();
        fs::write(dir.path().join("README.md"), "not a document").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.names().unwrap(), vec!["base", "flan-t5"]);

        let doc = source.load("flan-t5").unwrap().unwrap();
        assert_eq!(doc["serving"]["replicas"], Value::from(1));
        assert!(source.load("base").unwrap().is_some());
        assert!(source.load("missing").unwrap().is_none());
    }

    #[test]
    fn test_directory_source_missing_root_fails() {
        let source = DirectorySource::new("/nonexistent/topsail/documents");
        assert!(matches!(source.names(), Err(Error::Io { .. })));
    }

    #[test]
    fn test_mapping_source() {
        let source = MappingSource::from_yaml("b:\n  x: 1\na:\n  extends: b\n").unwrap();
        assert_eq!(source.names().unwrap(), vec!["a", "b"]);
        assert!(source.load("a").unwrap().is_some());
        assert!(source.load("c").unwrap().is_none());
    }

    #[test]
    fn test_mapping_source_rejects_non_mapping() {
        assert!(MappingSource::from_yaml("- a\n- b\n").is_err());
        assert!(MappingSource::from_yaml("~\n").unwrap().names().unwrap().is_empty());
    }
}

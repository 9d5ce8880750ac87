// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! `extends` inheritance resolution.
//!
//! A document may name one parent (`extends: base`) or several
//! (`extends: [a, b]`). Parents are resolved first, in listed order, and the
//! child is merged last so its keys win.

use crate::error::{Error, Result};
use crate::merge::merge_into;
use crate::source::DocumentSource;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

/// Key naming the parent document(s).
pub const EXTENDS_KEY: &str = "extends";

/// Resolves named documents against a [`DocumentSource`].
pub struct Resolver<S> {
    source: S,
}

impl<S: DocumentSource> Resolver<S> {
    /// Create a resolver over `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The underlying document source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Names of all available documents.
    pub fn available(&self) -> Result<Vec<String>> {
        self.source.names()
    }

    /// Load `name` and merge it over its whole `extends` ancestry.
    ///
    /// The returned mapping no longer carries the `extends` key.
    pub fn get_base_config(&self, name: &str) -> Result<Value> {
        let mut chain = Vec::new();
        let resolved = self.resolve(name, &mut chain)?;
        info!(name, "resolved configuration document");
        Ok(resolved)
    }

    fn resolve(&self, name: &str, chain: &mut Vec<String>) -> Result<Value> {
        if chain.iter().any(|visited| visited == name) {
            let mut looped = chain.clone();
            looped.push(name.to_string());
            return Err(Error::CircularExtends { chain: looped });
        }

        let document = match self.source.load(name)? {
            Some(Value::Mapping(map)) => map,
            Some(Value::Null) => Mapping::new(),
            Some(_) => return Err(Error::NotAMapping(name.to_string())),
            None => {
                return Err(Error::DocumentNotFound {
                    name: name.to_string(),
                    available: self.source.names().unwrap_or_default(),
                })
            }
        };

        let parents = match document.get(EXTENDS_KEY) {
            Some(extends) => parse_extends(name, extends.clone())?,
            None => Vec::new(),
        };
        // keeps key order, unlike Mapping::remove
        let document: Mapping = document
            .into_iter()
            .filter(|(key, _)| key.as_str() != Some(EXTENDS_KEY))
            .collect();

        chain.push(name.to_string());
        let mut merged = Value::Mapping(Mapping::new());
        for parent in &parents {
            debug!(child = name, parent = parent.as_str(), "applying parent document");
            let parent_config = self.resolve(parent, chain)?;
            merge_into(&mut merged, &parent_config);
        }
        chain.pop();

        merge_into(&mut merged, &Value::Mapping(document));
        Ok(merged)
    }
}

fn parse_extends(name: &str, extends: Value) -> Result<Vec<String>> {
    let invalid = |reason: &str| Error::InvalidExtends {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    match extends {
        Value::Null => Ok(Vec::new()),
        Value::String(parent) => Ok(vec![parent]),
        Value::Sequence(parents) => parents
            .into_iter()
            .map(|parent| match parent {
                Value::String(parent) => Ok(parent),
                _ => Err(invalid("list entries must be document names")),
            })
            .collect(),
        _ => Err(invalid("expected a document name or a list of names")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MappingSource, MockDocumentSource};

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn resolver(docs: &str) -> Resolver<MappingSource> {
        Resolver::new(MappingSource::from_yaml(docs).unwrap())
    }

    #[test]
    fn test_child_overrides_parent() {
        let r = resolver("parent:\n  x: 1\n  y: 2\nchild:\n  extends: parent\n  x: 3\n");
        assert_eq!(r.get_base_config("child").unwrap(), yaml("x: 3\ny: 2"));
    }

    #[test]
    fn test_multi_level_chain_and_extends_removed() {
        let r = resolver(
            "root:\n  a: root\n  nested: {k: root, keep: 1}\n\
             mid:\n  extends: root\n  nested: {k: mid}\n\
             leaf:\n  extends: mid\n  a: leaf\n",
        );
        let resolved = r.get_base_config("leaf").unwrap();
        assert_eq!(resolved, yaml("a: leaf\nnested: {k: mid, keep: 1}"));
        assert!(resolved.get(EXTENDS_KEY).is_none());
    }

    #[test]
    fn test_multiple_parents_later_wins() {
        let r = resolver(
            "a:\n  v: a\n  only_a: true\n\
             b:\n  v: b\n\
             c:\n  extends: [a, b]\n",
        );
        assert_eq!(r.get_base_config("c").unwrap(), yaml("v: b\nonly_a: true"));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let r = resolver(
            "base: {x: 1}\nleft: {extends: base, l: 1}\nright: {extends: base, r: 1}\n\
             top: {extends: [left, right]}\n",
        );
        assert_eq!(r.get_base_config("top").unwrap(), yaml("x: 1\nl: 1\nr: 1"));
    }

    #[test]
    fn test_missing_document() {
        let r = resolver("present: {x: 1}\n");
        match r.get_base_config("absent") {
            Err(Error::DocumentNotFound { name, available }) => {
                assert_eq!(name, "absent");
                assert_eq!(available, vec!["present"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_parent() {
        let r = resolver("child: {extends: ghost}\n");
        assert!(matches!(
            r.get_base_config("child"),
            Err(Error::DocumentNotFound { name, .. }) if name == "ghost"
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let r = resolver("a: {extends: b}\nb: {extends: c}\nc: {extends: a}\n");
        match r.get_base_config("a") {
            Err(Error::CircularExtends { chain }) => {
                assert_eq!(chain, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_extends() {
        let r = resolver("a: {extends: {nested: true}}\n");
        assert!(matches!(
            r.get_base_config("a"),
            Err(Error::InvalidExtends { .. })
        ));
    }

    #[test]
    fn test_loads_each_document_through_source() {
        let mut source = MockDocumentSource::new();
        source
            .expect_load()
            .withf(|name| name == "child")
            .times(1)
            .returning(|_| Ok(Some(yaml("extends: parent\nx: 3"))));
        source
            .expect_load()
            .withf(|name| name == "parent")
            .times(1)
            .returning(|_| Ok(Some(yaml("x: 1\ny: 2"))));

        let r = Resolver::new(source);
        assert_eq!(r.get_base_config("child").unwrap(), yaml("x: 3\ny: 2"));
    }
}

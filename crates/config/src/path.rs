// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Key paths into a configuration tree.
//!
//! Supported forms: `tests.e2e.models`, `tests.e2e.models[2].name`,
//! `ci_presets["light"]`, and `$` for the root.

use crate::error::{Error, Result};
use serde_yaml::Value;
use std::fmt;

/// One step of a key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Parse a key path into segments.
pub fn parse(path: &str) -> Result<Vec<Segment>> {
    let invalid = || Error::InvalidPath(path.to_string());

    let trimmed = path.trim();
    let body = match trimmed.strip_prefix('$') {
        Some(rest) => rest.strip_prefix('.').unwrap_or(rest),
        None => trimmed,
    };

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut after_bracket = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() {
                    if !after_bracket {
                        return Err(invalid());
                    }
                } else {
                    segments.push(Segment::Key(std::mem::take(&mut current)));
                }
                after_bracket = false;
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut current)));
                }

                match chars.peek().copied() {
                    Some(quote @ ('"' | '\'')) => {
                        chars.next();
                        let mut key = String::new();
                        loop {
                            match chars.next() {
                                Some(c) if c == quote => break,
                                Some(c) => key.push(c),
                                None => return Err(invalid()),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid());
                        }
                        segments.push(Segment::Key(key));
                    }
                    _ => {
                        let mut digits = String::new();
                        loop {
                            match chars.next() {
                                Some(']') => break,
                                Some(c) => digits.push(c),
                                None => return Err(invalid()),
                            }
                        }
                        let index = digits.trim().parse().map_err(|_| invalid())?;
                        segments.push(Segment::Index(index));
                    }
                }
                after_bracket = true;
            }
            _ => {
                if after_bracket {
                    return Err(invalid());
                }
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        segments.push(Segment::Key(current));
    } else if !after_bracket && !body.is_empty() {
        return Err(invalid());
    }

    Ok(segments)
}

/// Walk `segments` from `root`.
pub fn lookup<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = match (segment, current) {
            (Segment::Key(key), Value::Mapping(map)) => map.get(key.as_str())?,
            (Segment::Index(index), Value::Sequence(seq)) => seq.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Walk `segments` from `root`, mutably.
pub fn lookup_mut<'a>(root: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = match (segment, current) {
            (Segment::Key(key), Value::Mapping(map)) => map.get_mut(key.as_str())?,
            (Segment::Index(index), Value::Sequence(seq)) => seq.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[test]
    fn test_parse_dotted() {
        assert_eq!(parse("tests.e2e.mode").unwrap(), vec![key("tests"), key("e2e"), key("mode")]);
    }

    #[test]
    fn test_parse_index_and_quoted() {
        assert_eq!(
            parse("tests.e2e.models[2].name").unwrap(),
            vec![key("tests"), key("e2e"), key("models"), Segment::Index(2), key("name")]
        );
        assert_eq!(
            parse(r#"ci_presets["light.profile"]"#).unwrap(),
            vec![key("ci_presets"), key("light.profile")]
        );
        assert_eq!(parse("matrix[0][1]").unwrap(), vec![key("matrix"), Segment::Index(0), Segment::Index(1)]);
    }

    #[test]
    fn test_parse_root() {
        assert!(parse("$").unwrap().is_empty());
        assert_eq!(parse("$.a").unwrap(), vec![key("a")]);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["a..b", "a.", ".a", "a[x]", "a[1", r#"a["b"#, "a[0]b"] {
            assert!(parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_lookup() {
        let doc: Value = serde_yaml::from_str("a:\n  list:\n    - x: 1\n    - x: 2\n").unwrap();
        let segments = parse("a.list[1].x").unwrap();
        assert_eq!(lookup(&doc, &segments), Some(&Value::from(2)));
        assert!(lookup(&doc, &parse("a.list[5]").unwrap()).is_none());
        assert!(lookup(&doc, &parse("a.list.x").unwrap()).is_none());
    }
}

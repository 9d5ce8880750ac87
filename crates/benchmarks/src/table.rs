// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Renderer-agnostic comparison tables.

use serde::{Deserialize, Serialize};

/// Highlight attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Fastest execution time
    Fastest,
    /// Lowest usage value
    Lowest,
    /// Highest usage value
    Highest,
}

impl Marker {
    /// Display text of the marker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fastest => "⚡ FASTEST",
            Self::Lowest => "🔽 LOWEST",
            Self::Highest => "🔼 HIGHEST",
        }
    }
}

/// One table cell: a main value, an optional secondary line and marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Main text.
    pub text: String,
    /// Secondary line, e.g. `(Average of 3 runs)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Highlight marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl Cell {
    /// Plain text cell.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Empty cell.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach a secondary line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Attach a marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// The whole cell on one line.
    pub fn display(&self) -> String {
        let mut parts = vec![self.text.as_str()];
        if let Some(note) = &self.note {
            parts.push(note);
        }
        if let Some(marker) = &self.marker {
            parts.push(marker.as_str());
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::new(text)
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::new(text)
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// First column.
    pub label: String,
    /// Remaining columns.
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a row.
    pub fn new(label: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            label: label.into(),
            cells,
        }
    }
}

/// A titled table with a header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table title.
    pub title: String,
    /// Column headers, including the label column.
    pub headers: Vec<String>,
    /// Body rows.
    pub rows: Vec<Row>,
}

impl Table {
    /// Create an empty table.
    pub fn new(title: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Row with the given label.
    pub fn row(&self, label: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Whether the table has no body rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_display() {
        let cell = Cell::new("9.00s")
            .with_note("(Average of 3 runs)")
            .with_marker(Marker::Fastest);
        assert_eq!(cell.display(), "9.00s (Average of 3 runs) ⚡ FASTEST");
        assert_eq!(Cell::empty().display(), "");
        assert_eq!(Cell::from("N/A").display(), "N/A");
    }

    #[test]
    fn test_table_row_lookup() {
        let mut table = Table::new("t", vec!["".into(), "a".into()]);
        table.push(Row::new("x", vec![Cell::new("1")]));
        assert!(!table.is_empty());
        assert_eq!(table.row("x").unwrap().cells[0].text, "1");
        assert!(table.row("y").is_none());
    }
}

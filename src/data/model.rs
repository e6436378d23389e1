use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Label – one predicted class
// ---------------------------------------------------------------------------

/// A predicted class label, mirroring the dtypes a trained model's
/// `classes_` array usually carries (integers or strings).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Integer(i64),
    Text(String),
}

impl Label {
    /// Interpret the label as an integer class, accepting numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Label::Integer(i) => Some(*i),
            Label::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Integer(i) => write!(f, "{i}"),
            Label::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Integer(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the parsed upload
// ---------------------------------------------------------------------------

/// A numeric table: ordered column names plus rows of equal width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Ordered column names; `column_names.len()` is the table width.
    column_names: Vec<String>,
    /// Row-major cells.
    rows: Vec<Vec<f64>>,
}

/// Error raised when rows do not match the declared columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {row} has {actual} cells but the table has {expected} columns")]
pub struct RaggedRow {
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
}

impl Dataset {
    /// Build a dataset, checking every row against the column count.
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, RaggedRow> {
        let expected = column_names.len();
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(RaggedRow {
                row,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { column_names, rows })
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Append a column holding `fill` in every row.
    pub fn push_column(&mut self, name: impl Into<String>, fill: f64) {
        self.column_names.push(name.into());
        for row in &mut self.rows {
            row.push(fill);
        }
    }

    /// Keep only the first `width` columns.
    pub fn truncate_columns(&mut self, width: usize) {
        self.column_names.truncate(width);
        for row in &mut self.rows {
            row.truncate(width);
        }
    }
}

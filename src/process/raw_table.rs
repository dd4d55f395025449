use std::{borrow::Cow, fmt};

use crate::error::{PipelineError, PipelineResult};

/// Separator used by the source files for two-fuel readings, e.g. `6/4`.
pub const COMPOUND_SEPARATOR: char = '/';

/// Placeholder spellings the source files use for a missing value.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One loaded cell. Two-fuel vehicles carry two readings in one field;
/// those are tagged at load time so splitting never re-parses strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Scalar(String),
    Compound(String, String),
}

impl Cell {
    /// `None` for blank cells and NA placeholders. A value with exactly one
    /// separator and text on both sides becomes `Compound`. Text is kept as
    /// written; readings are trimmed only when taken apart by `part`.
    pub fn parse(raw: &str) -> Option<Cell> {
        let v = raw.trim();
        if v.is_empty() || NA_TOKENS.contains(&v) {
            return None;
        }
        let mut parts = raw.split(COMPOUND_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) if !a.trim().is_empty() && !b.trim().is_empty() => {
                Some(Cell::Compound(a.to_string(), b.to_string()))
            }
            _ => Some(Cell::Scalar(raw.to_string())),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Cell::Compound(..))
    }

    /// Reading at `index` (0 or 1). Scalars answer every index with themselves.
    pub fn part(&self, index: usize) -> Cell {
        match self {
            Cell::Scalar(_) => self.clone(),
            Cell::Compound(a, _) if index == 0 => Cell::Scalar(a.trim().to_string()),
            Cell::Compound(_, b) => Cell::Scalar(b.trim().to_string()),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Cell::Scalar(s) => Cow::Borrowed(s),
            Cell::Compound(a, b) => Cow::Owned(format!("{a}{COMPOUND_SEPARATOR}{b}")),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Label used in logs and errors, e.g. "2008".
    pub name: String,
    /// Column labels, as they currently stand in the pipeline.
    pub headers: Vec<String>,
    /// One entry per header; `None` is a null cell.
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Build from string rows; empty strings become nulls.
    pub fn from_strings(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| Cell::parse(c)).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> PipelineResult<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Same table with `rows` swapped in.
    pub fn with_rows(&self, rows: Vec<Vec<Option<Cell>>>) -> Self {
        Self {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Remove the given columns; every name must exist.
    pub fn drop_columns(self, columns: &[&str]) -> PipelineResult<Self> {
        let mut drop = Vec::with_capacity(columns.len());
        for c in columns {
            drop.push(self.column_index(c)?);
        }
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|i| !drop.contains(i))
            .collect();

        let headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Self {
            name: self.name,
            headers,
            rows,
        })
    }
}

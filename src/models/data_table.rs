use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A typed cell; missing cells are `None` in the row vectors
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An in-memory table with named columns, loaded whole from a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<CellValue>>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<CellValue>>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<CellValue>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Non-missing values of a column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx).and_then(|cell| cell.as_ref()))
                .collect(),
        )
    }

    /// Number of distinct non-missing values in a column
    pub fn unique_count(&self, name: &str) -> Option<usize> {
        let values = self.column_values(name)?;
        let distinct: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
        Some(distinct.len())
    }

    /// Distinct non-missing values, sorted by their text form
    pub fn distinct_text(&self, name: &str) -> Option<Vec<String>> {
        let values = self.column_values(name)?;
        let distinct: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
        Some(distinct.into_iter().collect())
    }

    /// Minimum and maximum of a numeric column
    pub fn numeric_range(&self, name: &str) -> Option<(f64, f64)> {
        self.column_values(name)?
            .iter()
            .filter_map(|v| v.as_f64())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }
}

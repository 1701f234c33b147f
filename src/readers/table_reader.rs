use crate::error::{Result, UploadError};
use crate::models::{CellValue, DataTable};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::UTF_8;
use std::path::Path;
use tracing::{info, warn};

/// Tokens read as missing values
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Float,
    Text,
}

/// Loads a whole CSV file into a [`DataTable`], inferring a type per column.
///
/// A column is integer if every present value parses as `i64`, float if every
/// present value parses as a finite `f64`, text otherwise. Integer columns with
/// missing values are widened to float.
pub struct TableReader {
    delimiter: u8,
}

impl TableReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn read_file(&self, path: &Path) -> Result<DataTable> {
        if !path.is_file() {
            return Err(UploadError::InputFileMissing(path.to_path_buf()));
        }

        info!("Reading CSV file: {}", path.display());
        let bytes = std::fs::read(path)?;

        // Sniffs and strips a UTF-8/UTF-16 BOM
        let (text, encoding, had_errors) = UTF_8.decode(&bytes);
        if had_errors {
            warn!(
                "{} contains malformed {} sequences; replaced with U+FFFD",
                path.display(),
                encoding.name()
            );
        }

        let table = self.read_str(&text)?;
        info!(
            "Successfully loaded {} records from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn read_str(&self, text: &str) -> Result<DataTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let records = reader
            .records()
            .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;

        let column_types: Vec<ColumnType> = (0..columns.len())
            .map(|idx| infer_column_type(records.iter().map(|r| r.get(idx).unwrap_or(""))))
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                column_types
                    .iter()
                    .enumerate()
                    .map(|(idx, column_type)| {
                        parse_cell(record.get(idx).unwrap_or(""), *column_type)
                    })
                    .collect()
            })
            .collect();

        Ok(DataTable::new(columns, rows))
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut column_type = ColumnType::Integer;
    let mut has_missing = false;

    for raw in values {
        if is_missing(raw) {
            has_missing = true;
            continue;
        }

        if column_type == ColumnType::Integer && raw.trim().parse::<i64>().is_err() {
            column_type = ColumnType::Float;
        }

        if column_type == ColumnType::Float && parse_finite(raw).is_none() {
            return ColumnType::Text;
        }
    }

    if column_type == ColumnType::Integer && has_missing {
        ColumnType::Float
    } else {
        column_type
    }
}

fn parse_cell(raw: &str, column_type: ColumnType) -> Option<CellValue> {
    if is_missing(raw) {
        return None;
    }

    match column_type {
        ColumnType::Integer => raw.trim().parse::<i64>().ok().map(CellValue::Integer),
        ColumnType::Float => parse_finite(raw).map(CellValue::Float),
        ColumnType::Text => Some(CellValue::Text(raw.to_string())),
    }
}

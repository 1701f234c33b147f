use crate::error::{Result, UploadError};
use crate::models::{CellValue, DataTable};
use serde::ser::{SerializeMap, Serializer as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "jsonl")]
    JsonLines,
    #[serde(rename = "csv")]
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonLines => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::JsonLines => "application/x-ndjson",
            OutputFormat::Csv => "text/csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => ".json",
            OutputFormat::JsonLines => ".jsonl",
            OutputFormat::Csv => ".csv",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::Json => "Standard JSON array format with proper indentation",
            OutputFormat::JsonLines => "JSON Lines format - one JSON object per line",
            OutputFormat::Csv => "Comma-separated values format",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UploadError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::JsonLines),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(UploadError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One table row serialized as a JSON object with keys in column order.
struct RecordView<'a> {
    columns: &'a [String],
    cells: &'a [Option<CellValue>],
}

impl Serialize for RecordView<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (idx, column) in self.columns.iter().enumerate() {
            // Short rows serialize their missing tail as null
            let cell = self.cells.get(idx).and_then(|c| c.as_ref());
            map.serialize_entry(column, &cell)?;
        }
        map.end()
    }
}

/// Renders a [`DataTable`] as the bytes of an upload object.
pub struct FormatConverter {
    format: OutputFormat,
    json_indent: usize,
}

impl FormatConverter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            json_indent: 2,
        }
    }

    /// Indentation for JSON arrays; 0 writes compact JSON
    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn convert(&self, table: &DataTable) -> Result<Vec<u8>> {
        match self.format {
            OutputFormat::Json => self.to_json(table),
            OutputFormat::JsonLines => self.to_json_lines(table),
            OutputFormat::Csv => self.to_csv(table),
        }
    }

    fn records<'a>(&self, table: &'a DataTable) -> impl Iterator<Item = RecordView<'a>> {
        table.rows().iter().map(|row| RecordView {
            columns: table.columns(),
            cells: row,
        })
    }

    fn to_json(&self, table: &DataTable) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        if self.json_indent == 0 {
            let mut serializer = serde_json::Serializer::new(&mut buffer);
            serializer.collect_seq(self.records(table))?;
        } else {
            let indent = vec![b' '; self.json_indent];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
            serializer.collect_seq(self.records(table))?;
        }

        Ok(buffer)
    }

    fn to_json_lines(&self, table: &DataTable) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        for record in self.records(table) {
            serde_json::to_writer(&mut buffer, &record)?;
            buffer.push(b'\n');
        }
        Ok(buffer)
    }

    fn to_csv(&self, table: &DataTable) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(table.columns())?;

        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| match cell {
                Some(value) => csv_text(value),
                None => String::new(),
            }))?;
        }

        writer
            .into_inner()
            .map_err(|e| UploadError::Io(e.into_error()))
    }
}

/// Whole floats keep a trailing `.0` so float columns read back as floats
fn csv_text(value: &CellValue) -> String {
    match value {
        CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => format!("{:.1}", v),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn monthly_table() -> DataTable {
        DataTable::new(
            vec![
                "city_name".to_string(),
                "MONTH".to_string(),
                "TAVG".to_string(),
            ],
            vec![
                vec![
                    Some(CellValue::Text("Reykjavík".to_string())),
                    Some(CellValue::Integer(1)),
                    Some(CellValue::Float(-0.5)),
                ],
                vec![
                    Some(CellValue::Text("Nairobi".to_string())),
                    Some(CellValue::Integer(2)),
                    None,
                ],
            ],
        )
    }

    fn convert(format: OutputFormat, indent: usize) -> String {
        let bytes = FormatConverter::new(format)
            .with_json_indent(indent)
            .convert(&monthly_table())
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_json_missing_values_are_null() {
        let json = convert(OutputFormat::Json, 2);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed[1]["TAVG"], serde_json::Value::Null);
        assert_eq!(parsed[0]["TAVG"], serde_json::json!(-0.5));
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn test_json_keeps_column_order_and_unicode() {
        let json = convert(OutputFormat::Json, 0);

        assert_eq!(
            json,
            r#"[{"city_name":"Reykjavík","MONTH":1,"TAVG":-0.5},{"city_name":"Nairobi","MONTH":2,"TAVG":null}]"#
        );
    }

    #[test]
    fn test_json_indent() {
        let json = convert(OutputFormat::Json, 2);
        assert!(json.starts_with("[\n  {\n    \"city_name\""));
    }

    #[test]
    fn test_json_lines() {
        let jsonl = convert(OutputFormat::JsonLines, 2);
        let lines: Vec<&str> = jsonl.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], r#"{"city_name":"Nairobi","MONTH":2,"TAVG":null}"#);
    }

    #[test]
    fn test_csv_output() {
        let csv = convert(OutputFormat::Csv, 2);

        assert_eq!(csv, "city_name,MONTH,TAVG\nReykjavík,1,-0.5\nNairobi,2,\n");
    }

    #[test]
    fn test_csv_whole_floats_keep_decimal_point() {
        assert_eq!(csv_text(&CellValue::Float(12.0)), "12.0");
        assert_eq!(csv_text(&CellValue::Float(12.25)), "12.25");
        assert_eq!(csv_text(&CellValue::Integer(12)), "12");
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(OutputFormat::JsonLines.content_type(), "application/x-ndjson");
        assert_eq!(OutputFormat::Csv.extension(), ".csv");
        assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::JsonLines);
        assert!(matches!(
            "parquet".parse::<OutputFormat>(),
            Err(UploadError::UnsupportedFormat(_))
        ));
    }
}

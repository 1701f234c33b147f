use crate::error::{Result, UploadError};
use csv::StringRecord;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity columns of the city climate profile CSV
pub const CITY_NAME: &str = "city_name";
pub const COUNTRY: &str = "country";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Decimal,
    Integer,
}

/// Mapping of one source column to one destination attribute
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub column: &'static str,
    pub attribute: &'static str,
    pub kind: FieldKind,
}

const fn field(column: &'static str, attribute: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        column,
        attribute,
        kind,
    }
}

/// Destination attributes of a city climate profile, in table order
pub const CLIMATE_FIELDS: &[FieldSpec] = &[
    // Basic city information
    field(CITY_NAME, "city_name", FieldKind::Text),
    field(COUNTRY, "country", FieldKind::Text),
    field("hemisphere", "hemisphere", FieldKind::Text),
    field(LAT, "latitude", FieldKind::Decimal),
    field(LON, "longitude", FieldKind::Decimal),
    // Temperature (°C)
    field("avg_annual_temp", "avg_annual_temp", FieldKind::Decimal),
    field("spring_TAVG", "spring_temp", FieldKind::Decimal),
    field("summer_TAVG", "summer_temp", FieldKind::Decimal),
    field("autumn_TAVG", "autumn_temp", FieldKind::Decimal),
    field("winter_TAVG", "winter_temp", FieldKind::Decimal),
    field("summer_TMAX", "summer_max_temp", FieldKind::Decimal),
    field("winter_TMIN", "winter_min_temp", FieldKind::Decimal),
    field("temp_range", "temperature_range", FieldKind::Decimal),
    // Precipitation (mm)
    field("annual_PRCP", "annual_precipitation", FieldKind::Decimal),
    field("spring_PRCP", "spring_precipitation", FieldKind::Decimal),
    field("summer_PRCP", "summer_precipitation", FieldKind::Decimal),
    field("autumn_PRCP", "autumn_precipitation", FieldKind::Decimal),
    field("winter_PRCP", "winter_precipitation", FieldKind::Decimal),
    // Seasonal characteristics
    field("wettest_season", "wettest_season", FieldKind::Text),
    field("driest_season", "driest_season", FieldKind::Text),
    field("climate_type", "climate_type", FieldKind::Text),
    // Data quality
    field("data_years", "data_years", FieldKind::Integer),
    field("total_records", "total_records", FieldKind::Integer),
];

/// One raw CSV row with by-name column lookup.
#[derive(Debug, Clone)]
pub struct CsvRow {
    columns: Arc<HashMap<String, usize>>,
    record: StringRecord,
    line: u64,
}

impl CsvRow {
    pub fn new(columns: Arc<HashMap<String, usize>>, record: StringRecord, line: u64) -> Self {
        Self {
            columns,
            record,
            line,
        }
    }

    /// Build a row from (column, value) pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let columns = pairs
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| (name.to_string(), idx))
            .collect();
        let record = pairs.iter().map(|(_, value)| *value).collect();
        Self::new(Arc::new(columns), record, 2)
    }

    /// Source line number (the header is line 1)
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .map(|&idx| self.record.get(idx).unwrap_or(""))
    }

    /// Look up a column by exact name, failing if the file lacks it
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column).ok_or_else(|| UploadError::MissingColumn {
            column: column.to_string(),
            line: self.line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_name() {
        let row = CsvRow::from_pairs(&[("city_name", "Lisbon"), ("country", "Portugal")]);

        assert_eq!(row.get("city_name"), Some("Lisbon"));
        assert_eq!(row.require("country").unwrap(), "Portugal");
        assert_eq!(row.get("City_Name"), None);
    }

    #[test]
    fn test_missing_column_reports_line() {
        let row = CsvRow::from_pairs(&[("city_name", "Lisbon")]);

        match row.require("lat") {
            Err(UploadError::MissingColumn { column, line }) => {
                assert_eq!(column, "lat");
                assert_eq!(line, 2);
            }
            other => panic!("expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn test_field_map_attributes_are_unique() {
        let mut attributes: Vec<&str> = CLIMATE_FIELDS.iter().map(|f| f.attribute).collect();
        attributes.sort_unstable();
        attributes.dedup();
        assert_eq!(attributes.len(), CLIMATE_FIELDS.len());
    }
}

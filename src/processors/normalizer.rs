use crate::error::{Result, UploadError};
use crate::models::climate::{CITY_NAME, COUNTRY, LAT, LON};
use crate::models::{CsvRow, FieldKind, FieldValue, ItemKey, TableItem, CLIMATE_FIELDS};

/// Maps raw CSV rows to typed table items.
///
/// In the default permissive mode an empty or unparsable numeric field becomes
/// zero. Strict mode rejects unparsable non-empty values instead; empty values
/// are still zero.
pub struct RowNormalizer {
    strict: bool,
}

impl RowNormalizer {
    pub fn new() -> Self {
        Self { strict: false }
    }

    pub fn with_strict_mode(strict: bool) -> Self {
        Self { strict }
    }

    /// Rows with a blank city name carry no profile and are skipped
    pub fn is_blank(&self, row: &CsvRow) -> Result<bool> {
        Ok(row.require(CITY_NAME)?.trim().is_empty())
    }

    pub fn normalize(&self, row: &CsvRow) -> Result<TableItem> {
        let key = ItemKey::new(
            row.require(CITY_NAME)?,
            row.require(COUNTRY)?,
            row.require(LAT)?,
            row.require(LON)?,
        );

        let mut item = TableItem::new(key);
        for field in CLIMATE_FIELDS {
            let raw = row.require(field.column)?;
            let value = match field.kind {
                FieldKind::Text => FieldValue::Text(raw.to_string()),
                FieldKind::Decimal => FieldValue::Number(self.decimal(raw, field.column, row)?),
                FieldKind::Integer => FieldValue::Integer(self.integer(raw, field.column, row)?),
            };
            item.insert(field.attribute, value);
        }

        Ok(item)
    }

    fn decimal(&self, raw: &str, column: &str, row: &CsvRow) -> Result<f64> {
        match parse_decimal(raw) {
            Some(value) => Ok(value),
            None if self.strict => Err(coercion_error(raw, column, row)),
            None => Ok(0.0),
        }
    }

    fn integer(&self, raw: &str, column: &str, row: &CsvRow) -> Result<i64> {
        match parse_integer(raw) {
            Some(value) => Ok(value),
            None if self.strict => Err(coercion_error(raw, column, row)),
            None => Ok(0),
        }
    }
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn coercion_error(raw: &str, column: &str, row: &CsvRow) -> UploadError {
    UploadError::FieldCoercion {
        column: column.to_string(),
        value: raw.to_string(),
        line: row.line(),
    }
}

/// Empty parses as zero; malformed or non-finite yields `None`
fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parsed as a decimal, then truncated toward zero
fn parse_integer(raw: &str) -> Option<i64> {
    parse_decimal(raw).map(|v| v.trunc() as i64)
}

/// Permissive decimal coercion: anything unparsable is zero
pub fn coerce_decimal(raw: &str) -> f64 {
    parse_decimal(raw).unwrap_or(0.0)
}

/// Permissive integer coercion: anything unparsable is zero
pub fn coerce_integer(raw: &str) -> i64 {
    parse_integer(raw).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_row(overrides: &[(&str, &str)]) -> CsvRow {
        let mut pairs: Vec<(&str, &str)> = vec![
            ("city_name", "Lisbon"),
            ("country", "Portugal"),
            ("hemisphere", "Northern"),
            ("lat", "38.72"),
            ("lon", "-9.14"),
            ("avg_annual_temp", "17.4"),
            ("spring_TAVG", "16.1"),
            ("summer_TAVG", "22.9"),
            ("autumn_TAVG", "19.2"),
            ("winter_TAVG", "11.6"),
            ("summer_TMAX", "28.3"),
            ("winter_TMIN", "8.3"),
            ("temp_range", "20.0"),
            ("annual_PRCP", "725.5"),
            ("spring_PRCP", "160.2"),
            ("summer_PRCP", "20.1"),
            ("autumn_PRCP", "230.4"),
            ("winter_PRCP", "314.8"),
            ("wettest_season", "Winter"),
            ("driest_season", "Summer"),
            ("climate_type", "Mediterranean"),
            ("data_years", "30"),
            ("total_records", "10950"),
        ];
        for (column, value) in overrides {
            if let Some(pair) = pairs.iter_mut().find(|(c, _)| c == column) {
                pair.1 = *value;
            }
        }
        CsvRow::from_pairs(&pairs)
    }

    #[test]
    fn test_coerce_decimal_fallback() {
        assert_eq!(coerce_decimal("12.5"), 12.5);
        assert_eq!(coerce_decimal(" -3 "), -3.0);
        assert_eq!(coerce_decimal(""), 0.0);
        assert_eq!(coerce_decimal("   "), 0.0);
        assert_eq!(coerce_decimal("n/a"), 0.0);
        assert_eq!(coerce_decimal("12,5"), 0.0);
        assert_eq!(coerce_decimal("NaN"), 0.0);
        assert_eq!(coerce_decimal("inf"), 0.0);
    }

    #[test]
    fn test_coerce_integer_truncates() {
        assert_eq!(coerce_integer("30"), 30);
        assert_eq!(coerce_integer("12.7"), 12);
        assert_eq!(coerce_integer("-12.7"), -12);
        assert_eq!(coerce_integer("1e3"), 1000);
        assert_eq!(coerce_integer(""), 0);
        assert_eq!(coerce_integer("thirty"), 0);
    }

    #[test]
    fn test_normalize_full_row() -> Result<()> {
        let item = RowNormalizer::new().normalize(&profile_row(&[]))?;

        assert_eq!(item.key.city_country, "Lisbon, Portugal");
        assert_eq!(item.key.coordinates, "38.72,-9.14");
        assert_eq!(item.get("latitude"), Some(&FieldValue::Number(38.72)));
        assert_eq!(item.get("spring_temp"), Some(&FieldValue::Number(16.1)));
        assert_eq!(item.get("temperature_range"), Some(&FieldValue::Number(20.0)));
        assert_eq!(item.get("data_years"), Some(&FieldValue::Integer(30)));
        assert_eq!(
            item.get("climate_type"),
            Some(&FieldValue::Text("Mediterranean".to_string()))
        );
        assert_eq!(item.field_count(), CLIMATE_FIELDS.len() + 2);

        Ok(())
    }

    #[test]
    fn test_malformed_numbers_never_fail_in_permissive_mode() -> Result<()> {
        let row = profile_row(&[
            ("summer_TAVG", ""),
            ("winter_PRCP", "trace"),
            ("data_years", "unknown"),
        ]);
        let item = RowNormalizer::new().normalize(&row)?;

        assert_eq!(item.get("summer_temp"), Some(&FieldValue::Number(0.0)));
        assert_eq!(item.get("winter_precipitation"), Some(&FieldValue::Number(0.0)));
        assert_eq!(item.get("data_years"), Some(&FieldValue::Integer(0)));

        Ok(())
    }

    #[test]
    fn test_strict_mode_rejects_malformed_numbers() {
        let normalizer = RowNormalizer::with_strict_mode(true);
        let row = profile_row(&[("winter_PRCP", "trace")]);

        match normalizer.normalize(&row) {
            Err(UploadError::FieldCoercion { column, value, .. }) => {
                assert_eq!(column, "winter_PRCP");
                assert_eq!(value, "trace");
            }
            other => panic!("expected coercion error, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_mode_still_zeroes_empty_fields() -> Result<()> {
        let normalizer = RowNormalizer::with_strict_mode(true);
        let item = normalizer.normalize(&profile_row(&[("summer_TMAX", "")]))?;

        assert_eq!(item.get("summer_max_temp"), Some(&FieldValue::Number(0.0)));
        Ok(())
    }

    #[test]
    fn test_missing_column_fails_row() {
        let row = CsvRow::from_pairs(&[
            ("city_name", "Lisbon"),
            ("country", "Portugal"),
            ("lat", "38.72"),
            ("lon", "-9.14"),
        ]);

        assert!(matches!(
            RowNormalizer::new().normalize(&row),
            Err(UploadError::MissingColumn { column, .. }) if column == "hemisphere"
        ));
    }

    #[test]
    fn test_blank_city_detection() -> Result<()> {
        let normalizer = RowNormalizer::new();

        assert!(normalizer.is_blank(&profile_row(&[("city_name", "  ")]))?);
        assert!(!normalizer.is_blank(&profile_row(&[]))?);
        Ok(())
    }
}

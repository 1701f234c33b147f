use climate_upload::models::{CellValue, CsvRow, DataTable, ItemKey, TableItem};
use climate_upload::processors::{last_write_wins, Batcher, RowNormalizer};
use climate_upload::writers::{FormatConverter, OutputFormat};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const NUMERIC_COLUMNS: [&str; 13] = [
    "avg_annual_temp",
    "spring_TAVG",
    "summer_TAVG",
    "autumn_TAVG",
    "winter_TAVG",
    "summer_TMAX",
    "winter_TMIN",
    "temp_range",
    "annual_PRCP",
    "spring_PRCP",
    "summer_PRCP",
    "autumn_PRCP",
    "winter_PRCP",
];

// Every fourth row has an empty or malformed numeric field
fn create_profile_rows(count: usize) -> Vec<CsvRow> {
    (0..count)
        .map(|i| {
            let city = format!("City {}", i);
            let lat = format!("{:.2}", -60.0 + (i % 120) as f64);
            let temp = match i % 4 {
                0 => String::new(),
                1 => "n/a".to_string(),
                _ => format!("{:.1}", 10.0 + (i % 20) as f64 * 0.5),
            };

            let mut pairs: Vec<(&str, &str)> = vec![
                ("city_name", &city),
                ("country", "Testland"),
                ("hemisphere", "Southern"),
                ("lat", &lat),
                ("lon", "12.5"),
                ("wettest_season", "Winter"),
                ("driest_season", "Summer"),
                ("climate_type", "Oceanic"),
                ("data_years", "30"),
                ("total_records", "10950"),
            ];
            pairs.extend(NUMERIC_COLUMNS.iter().map(|c| (*c, temp.as_str())));
            CsvRow::from_pairs(&pairs)
        })
        .collect()
}

fn create_items(count: usize) -> Vec<TableItem> {
    (0..count)
        .map(|i| {
            // Roughly one key in ten repeats
            let city = format!("City {}", i - i % 10 * (i % 2));
            TableItem::new(ItemKey::new(&city, "Testland", "1.0", "2.0"))
        })
        .collect()
}

fn create_monthly_table(rows: usize) -> DataTable {
    let columns = ["city_name", "YEAR", "MONTH", "TAVG", "PRCP"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let data = (0..rows)
        .map(|i| {
            vec![
                Some(CellValue::Text(format!("City {}", i % 300))),
                Some(CellValue::Integer(1991 + (i / 3600) as i64)),
                Some(CellValue::Integer(1 + (i % 12) as i64)),
                Some(CellValue::Float(15.0 + (i % 30) as f64 * 0.3)),
                if i % 7 == 0 {
                    None
                } else {
                    Some(CellValue::Float((i % 90) as f64))
                },
            ]
        })
        .collect();
    DataTable::new(columns, data)
}

fn benchmark_normalizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalizer");

    for size in [300, 3000].iter() {
        let rows = create_profile_rows(*size);

        for strict in [false, true] {
            let normalizer = RowNormalizer::with_strict_mode(strict);
            let label = if strict { "strict" } else { "permissive" };

            group.bench_with_input(BenchmarkId::new(label, size), &rows, |b, rows| {
                b.iter(|| {
                    let items: Vec<_> = rows
                        .iter()
                        .map(|row| normalizer.normalize(black_box(row)))
                        .collect();
                    black_box(items)
                });
            });
        }
    }

    group.finish();
}

fn benchmark_batcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("batcher");
    let batcher = Batcher::new(25).unwrap();

    for size in [1000, 10000].iter() {
        let items = create_items(*size);

        group.bench_with_input(BenchmarkId::new("batch_and_dedupe", size), &items, |b, items| {
            b.iter(|| {
                let written: usize = batcher
                    .batches(items.iter().cloned())
                    .map(|batch| last_write_wins(batch).len())
                    .sum();
                black_box(written)
            });
        });
    }

    group.finish();
}

fn benchmark_format_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_conversion");
    let table = create_monthly_table(36_000);

    for format in [OutputFormat::Json, OutputFormat::JsonLines, OutputFormat::Csv] {
        let converter = FormatConverter::new(format).with_json_indent(2);

        group.bench_with_input(BenchmarkId::new("convert", format), &table, |b, table| {
            b.iter(|| black_box(converter.convert(black_box(table)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_normalizer,
    benchmark_batcher,
    benchmark_format_conversion
);
criterion_main!(benches);

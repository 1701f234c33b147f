pub mod climate_reader;
pub mod table_reader;

pub use climate_reader::{ClimateReader, CsvRowIterator};
pub use table_reader::TableReader;

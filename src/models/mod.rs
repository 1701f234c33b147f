pub mod climate;
pub mod data_table;
pub mod dataset;
pub mod item;

pub use climate::{CsvRow, FieldKind, FieldSpec, CLIMATE_FIELDS};
pub use data_table::{CellValue, DataTable};
pub use dataset::{DatasetKind, DatasetMode};
pub use item::{FieldValue, ItemKey, TableItem};

use crate::error::{Result, UploadError};
use crate::models::CsvRow;
use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

const UTF8_BOM: char = '\u{feff}';

/// Streams city climate rows from a headed CSV file.
pub struct ClimateReader {
    delimiter: u8,
}

impl ClimateReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Open a CSV file for streaming
    pub fn open(&self, path: &Path) -> Result<CsvRowIterator<File>> {
        if !path.is_file() {
            return Err(UploadError::InputFileMissing(path.to_path_buf()));
        }

        let file = File::open(path)?;
        self.from_reader(file)
    }

    /// Stream rows from any reader; the first record is the header
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<CsvRowIterator<R>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let columns = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim_start_matches(UTF8_BOM).to_string(), idx))
            .collect();

        Ok(CsvRowIterator {
            reader,
            columns: Arc::new(columns),
            record: StringRecord::new(),
            finished: false,
        })
    }
}

impl Default for ClimateReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy iterator over CSV rows; stops after the first read error.
pub struct CsvRowIterator<R> {
    reader: Reader<R>,
    columns: Arc<HashMap<String, usize>>,
    record: StringRecord,
    finished: bool,
}

impl<R> CsvRowIterator<R> {
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, usize)> = self
            .columns
            .iter()
            .map(|(name, &idx)| (name.as_str(), idx))
            .collect();
        names.sort_by_key(|(_, idx)| *idx);
        names.into_iter().map(|(name, _)| name).collect()
    }
}

impl<R: Read> Iterator for CsvRowIterator<R> {
    type Item = Result<CsvRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                Some(Ok(CsvRow::new(
                    Arc::clone(&self.columns),
                    self.record.clone(),
                    line,
                )))
            }
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            }
        }
    }
}

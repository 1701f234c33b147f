use super::state::{StateTracker, UploadState};
use crate::config::TableSettings;
use crate::error::{Result, UploadError};
use crate::models::{CsvRow, ItemKey, TableItem};
use crate::processors::{last_write_wins, Batcher, KeyTracker, RowNormalizer};
use crate::readers::ClimateReader;
use crate::reporters::{TableRunReport, UploadCounts, Verification};
use crate::utils::constants::{MAX_BATCH_SIZE, TABLE_POLL_INTERVAL_MS};
use crate::utils::progress::ProgressReporter;
use crate::writers::{KeySchema, TableStore};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Uploads city climate profiles into a key-value table.
///
/// Each run walks `connected -> resource-ready -> writing -> done`; any error
/// moves it to `failed` and later calls are rejected.
pub struct TableUploader<S: TableStore> {
    store: S,
    settings: TableSettings,
    region: String,
    state: StateTracker,
    poll_interval: Duration,
    quiet: bool,
}

impl<S: TableStore> TableUploader<S> {
    /// Wrap a store whose client connection is already established
    pub fn connect(store: S, settings: TableSettings, region: &str) -> Result<Self> {
        let mut state = StateTracker::new("table");
        state.advance(UploadState::Connected)?;

        Ok(Self {
            store,
            settings,
            region: region.to_string(),
            state,
            poll_interval: Duration::from_millis(TABLE_POLL_INTERVAL_MS),
            quiet: false,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn state(&self) -> UploadState {
        self.state.state()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Stream the CSV at `path` into the table and verify the result.
    pub async fn run(&mut self, path: &Path) -> Result<TableRunReport> {
        info!(
            "Starting upload of {} to table {}",
            path.display(),
            self.settings.table_name
        );

        let rows = match ClimateReader::new().open(path) {
            Ok(rows) => rows,
            Err(e) => {
                self.state.fail();
                return Err(e);
            }
        };

        self.ensure_table_exists().await?;
        let counts = self.upload_rows(rows).await?;
        let verification = self.verify().await;

        Ok(TableRunReport {
            table_name: self.settings.table_name.clone(),
            region: self.region.clone(),
            counts,
            verification,
        })
    }

    /// Create the table if missing and wait until it is usable
    pub async fn ensure_table_exists(&mut self) -> Result<()> {
        self.state.ensure_active()?;

        match self.provision_table().await {
            Ok(()) => self.state.advance(UploadState::ResourceReady),
            Err(e) => {
                error!("Table provisioning failed: {}", e);
                self.state.fail();
                Err(e)
            }
        }
    }

    async fn provision_table(&self) -> Result<()> {
        let table = &self.settings.table_name;
        let existing = self.store.list_tables().await?;

        if existing.iter().any(|name| name == table) {
            info!("Table {} already exists", table);
        } else {
            info!("Creating table {}...", table);
            self.store
                .create_table(table, &KeySchema::default())
                .await
                .map_err(|e| UploadError::provisioning(format!("table '{}'", table), e.to_string()))?;
        }

        self.wait_until_active().await?;
        info!("Table {} is active", table);
        Ok(())
    }

    async fn wait_until_active(&self) -> Result<()> {
        let table = &self.settings.table_name;
        let timeout = Duration::from_secs(self.settings.wait_timeout_secs);
        let deadline = Instant::now() + timeout;

        loop {
            let status = self.store.table_status(table).await?;
            if status.is_active() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(UploadError::provisioning(
                    format!("table '{}'", table),
                    format!("still {} after {}s", status, timeout.as_secs()),
                ));
            }
            debug!("Table {} is {}, waiting", table, status);
            sleep(self.poll_interval).await;
        }
    }

    /// Normalize, batch and write every row; stops at the first failure.
    pub async fn upload_rows<I>(&mut self, rows: I) -> Result<UploadCounts>
    where
        I: Iterator<Item = Result<CsvRow>>,
    {
        self.state.advance(UploadState::Writing)?;

        let progress = ProgressReporter::new_spinner(
            &format!("Uploading to {}", self.settings.table_name),
            self.quiet,
        );

        match self.write_rows(rows, &progress).await {
            Ok(counts) => {
                progress.finish_with_message(&format!(
                    "Uploaded {} items",
                    counts.items_written
                ));
                info!(
                    "Successfully uploaded {} items in {} batches",
                    counts.items_written, counts.batches_written
                );
                self.state.advance(UploadState::Done)?;
                Ok(counts)
            }
            Err(e) => {
                progress.abandon();
                error!("Upload to {} failed: {}", self.settings.table_name, e);
                self.state.fail();
                Err(e)
            }
        }
    }

    async fn write_rows<I>(&self, rows: I, progress: &ProgressReporter) -> Result<UploadCounts>
    where
        I: Iterator<Item = Result<CsvRow>>,
    {
        let normalizer = RowNormalizer::with_strict_mode(self.settings.strict_numeric);
        let batcher = Batcher::with_limit(self.settings.batch_size, MAX_BATCH_SIZE)?;
        let mut tracker = KeyTracker::new();
        let mut rows_read = 0usize;
        let mut rows_skipped = 0usize;
        let mut counts = UploadCounts::default();

        let items = rows.filter_map(|row| {
            let row = match row {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            rows_read += 1;

            match normalizer.is_blank(&row) {
                Ok(true) => {
                    debug!("Skipping line {}: blank city name", row.line());
                    rows_skipped += 1;
                    return None;
                }
                Ok(false) => {}
                Err(e) => return Some(Err(e)),
            }

            Some(normalizer.normalize(&row).map(|item| {
                tracker.observe(&item.key, row.line());
                item
            }))
        });

        for (index, batch) in batcher.batches(items).enumerate() {
            let batch = batch.into_iter().collect::<Result<Vec<TableItem>>>()?;
            let written = self.write_batch(index + 1, batch).await?;

            counts.items_written += written;
            counts.batches_written += 1;
            progress.increment(written as u64);
        }

        counts.rows_read = rows_read;
        counts.rows_skipped = rows_skipped;
        counts.key_collisions = tracker.collisions();

        if counts.rows_skipped > 0 {
            warn!("Skipped {} rows with a blank city name", counts.rows_skipped);
        }
        Ok(counts)
    }

    /// Write one batch, resubmitting items the service leaves unprocessed.
    ///
    /// Returns the number of items written after same-key deduplication.
    pub async fn write_batch(&self, batch_number: usize, items: Vec<TableItem>) -> Result<usize> {
        let table = &self.settings.table_name;
        let rounds = self.settings.max_unprocessed_rounds;
        let mut pending = last_write_wins(items);
        let total = pending.len();

        let batch_error = |message: String| UploadError::BatchWrite {
            batch: batch_number,
            items: total,
            message,
        };

        for round in 0..=rounds {
            if round > 0 {
                warn!(
                    "Batch {}: resubmitting {} unprocessed items (round {}/{})",
                    batch_number,
                    pending.len(),
                    round,
                    rounds
                );
                sleep(Duration::from_millis(50 << round.min(6))).await;
            }

            let unprocessed = self
                .store
                .batch_write(table, &pending)
                .await
                .map_err(|e| batch_error(e.to_string()))?;

            if unprocessed.is_empty() {
                debug!("Wrote batch {} ({} items)", batch_number, total);
                return Ok(total);
            }

            let unprocessed: HashSet<ItemKey> = unprocessed.into_iter().collect();
            pending.retain(|item| unprocessed.contains(&item.key));
            if pending.is_empty() {
                return Ok(total);
            }
        }

        Err(batch_error(format!(
            "{} items still unprocessed after {} resubmissions",
            pending.len(),
            rounds
        )))
    }

    /// Count, sample and status check of the table; never fails the run
    pub async fn verify(&self) -> Verification {
        match self.read_back().await {
            Ok(verification) => verification,
            Err(e) => {
                warn!("Could not verify table {}: {}", self.settings.table_name, e);
                Verification::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn read_back(&self) -> Result<Verification> {
        let table = &self.settings.table_name;
        let total_items = self.store.count_items(table).await?;
        let sample_item = self.store.sample_item(table).await?;
        let table_status = self.store.table_status(table).await?;

        info!("Table {} holds {} items", table, total_items);
        Ok(Verification::Completed {
            total_items,
            sample_item,
            table_status: table_status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::FieldValue;
    use crate::writers::MemoryTableStore;

    fn settings(batch_size: usize) -> TableSettings {
        TableSettings {
            batch_size,
            table_name: "Profiles".to_string(),
            ..Settings::default().table
        }
    }

    fn uploader(store: MemoryTableStore, batch_size: usize) -> TableUploader<MemoryTableStore> {
        TableUploader::connect(store, settings(batch_size), "us-east-1")
            .unwrap()
            .with_poll_interval(Duration::from_millis(1))
            .with_quiet(true)
    }

    fn item(city: &str) -> TableItem {
        TableItem::new(ItemKey::new(city, "Kenya", "-1.29", "36.82"))
            .with_attribute("data_years", FieldValue::Integer(30))
    }

    #[tokio::test]
    async fn test_creates_missing_table_and_waits() -> Result<()> {
        let mut uploader = uploader(MemoryTableStore::new().with_creation_polls(3), 25);

        uploader.ensure_table_exists().await?;

        assert_eq!(uploader.state(), UploadState::ResourceReady);
        assert_eq!(uploader.store().schema("Profiles"), Some(KeySchema::default()));
        Ok(())
    }

    #[tokio::test]
    async fn test_table_creation_timeout() {
        let store = MemoryTableStore::new().with_creation_polls(u32::MAX);
        let mut settings = settings(25);
        settings.wait_timeout_secs = 1;
        let mut uploader = TableUploader::connect(store, settings, "us-east-1")
            .unwrap()
            .with_poll_interval(Duration::from_millis(200))
            .with_quiet(true);

        let result = uploader.ensure_table_exists().await;

        assert!(matches!(result, Err(UploadError::ResourceProvisioning { .. })));
        assert_eq!(uploader.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn test_unprocessed_items_are_resubmitted() -> Result<()> {
        let store = MemoryTableStore::new().with_table("Profiles").with_unprocessed(2);
        let uploader = uploader(store, 25);

        let written = uploader
            .write_batch(1, vec![item("Nairobi"), item("Mombasa"), item("Kisumu")])
            .await?;

        assert_eq!(written, 3);
        assert_eq!(uploader.store().count_items("Profiles").await?, 3);
        assert_eq!(uploader.store().batch_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unprocessed_rounds_are_bounded() {
        let store = MemoryTableStore::new()
            .with_table("Profiles")
            .with_unprocessed(usize::MAX);
        let mut settings = settings(25);
        settings.max_unprocessed_rounds = 2;
        let uploader = TableUploader::connect(store, settings, "us-east-1")
            .unwrap()
            .with_quiet(true);

        let result = uploader.write_batch(4, vec![item("Nakuru")]).await;

        assert!(matches!(result, Err(UploadError::BatchWrite { batch: 4, .. })));
        assert_eq!(uploader.store().batch_calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_batch_aborts_run_and_keeps_prior_batches() -> Result<()> {
        let store = MemoryTableStore::new().failing_on_batch(2);
        let mut uploader = uploader(store, 1);
        uploader.ensure_table_exists().await?;

        let rows = ["Nairobi", "Mombasa", "Kisumu"].map(|city| {
            Ok(CsvRow::from_pairs(&profile_pairs(city)))
        });
        let result = uploader.upload_rows(rows.into_iter()).await;

        assert!(matches!(result, Err(UploadError::BatchWrite { batch: 2, .. })));
        assert_eq!(uploader.state(), UploadState::Failed);
        assert_eq!(uploader.store().count_items("Profiles").await?, 1);
        assert!(uploader.ensure_table_exists().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_rows_are_skipped() -> Result<()> {
        let mut uploader = uploader(MemoryTableStore::new(), 25);
        uploader.ensure_table_exists().await?;

        let rows = vec![
            Ok(CsvRow::from_pairs(&profile_pairs("Nairobi"))),
            Ok(CsvRow::from_pairs(&profile_pairs(" "))),
        ];
        let counts = uploader.upload_rows(rows.into_iter()).await?;

        assert_eq!(counts.rows_read, 2);
        assert_eq!(counts.rows_skipped, 1);
        assert_eq!(counts.items_written, 1);
        assert_eq!(uploader.state(), UploadState::Done);
        Ok(())
    }

    #[tokio::test]
    async fn test_verification_failure_is_a_value() -> Result<()> {
        let uploader = uploader(MemoryTableStore::new(), 25);

        match uploader.verify().await {
            Verification::Failed { error } => assert!(error.contains("Profiles")),
            other => panic!("expected failed verification, got {:?}", other),
        }
        Ok(())
    }

    fn profile_pairs(city: &str) -> Vec<(&str, &str)> {
        let mut pairs = vec![
            ("city_name", city),
            ("country", "Kenya"),
            ("hemisphere", "Southern"),
            ("lat", "-1.29"),
            ("lon", "36.82"),
            ("wettest_season", "Spring"),
            ("driest_season", "Summer"),
            ("climate_type", "Subtropical highland"),
            ("data_years", "30"),
            ("total_records", "10950"),
        ];
        for column in [
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
        ] {
            pairs.push((column, "12.5"));
        }
        pairs
    }
}

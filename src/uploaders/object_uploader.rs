use super::state::{StateTracker, UploadState};
use crate::config::ObjectSettings;
use crate::error::{Result, UploadError};
use crate::models::{DataTable, DatasetKind, DatasetMode};
use crate::readers::TableReader;
use crate::reporters::{FileSummary, ObjectRunReport, UploadSummary};
use crate::utils::filename::{data_object_key, summary_object_key};
use crate::utils::progress::ProgressReporter;
use crate::writers::{BlobStore, BucketCreation, FormatConverter, PutObjectRequest};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Uploads climate datasets as timestamped objects plus a run summary.
pub struct ObjectUploader<B: BlobStore> {
    store: B,
    settings: ObjectSettings,
    region: String,
    run_timestamp: DateTime<Utc>,
    state: StateTracker,
    quiet: bool,
}

impl<B: BlobStore> ObjectUploader<B> {
    /// Wrap a store whose client connection is already established
    pub fn connect(store: B, settings: ObjectSettings, region: &str) -> Result<Self> {
        let mut state = StateTracker::new("objects");
        state.advance(UploadState::Connected)?;

        Ok(Self {
            store,
            settings,
            region: region.to_string(),
            run_timestamp: Utc::now(),
            state,
            quiet: false,
        })
    }

    /// Every object key of the run embeds this timestamp
    pub fn with_run_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.run_timestamp = timestamp;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn state(&self) -> UploadState {
        self.state.state()
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn into_store(self) -> B {
        self.store
    }

    /// Input files selected by `mode`; missing files are skipped with a warning.
    ///
    /// Fails with [`UploadError::InputFileMissing`] when none remain.
    pub fn resolve_inputs(
        settings: &ObjectSettings,
        mode: DatasetMode,
    ) -> Result<Vec<(DatasetKind, PathBuf)>> {
        let mut inputs = Vec::new();
        let mut first_missing = None;

        for &kind in mode.datasets() {
            let path = settings.input_for(kind);
            if path.is_file() {
                inputs.push((kind, path.to_path_buf()));
            } else {
                warn!("{} data file not found: {}", kind, path.display());
                first_missing.get_or_insert_with(|| path.to_path_buf());
            }
        }

        match (inputs.is_empty(), first_missing) {
            (true, Some(path)) => Err(UploadError::InputFileMissing(path)),
            _ => Ok(inputs),
        }
    }

    pub async fn run(&mut self, mode: DatasetMode) -> Result<ObjectRunReport> {
        info!(
            "Uploading {} data to bucket {} as {}",
            mode, self.settings.bucket_name, self.settings.output_format
        );

        let inputs = match Self::resolve_inputs(&self.settings, mode) {
            Ok(inputs) => inputs,
            Err(e) => {
                self.state.fail();
                return Err(e);
            }
        };

        self.ensure_bucket_exists().await?;
        self.state.advance(UploadState::Writing)?;

        match self.upload_all(&inputs).await {
            Ok(report) => {
                self.state.advance(UploadState::Done)?;
                Ok(report)
            }
            Err(e) => {
                error!("Object upload failed: {}", e);
                self.state.fail();
                Err(e)
            }
        }
    }

    pub async fn ensure_bucket_exists(&mut self) -> Result<()> {
        self.state.ensure_active()?;

        match self.provision_bucket().await {
            Ok(()) => self.state.advance(UploadState::ResourceReady),
            Err(e) => {
                error!("Bucket provisioning failed: {}", e);
                self.state.fail();
                Err(e)
            }
        }
    }

    async fn provision_bucket(&self) -> Result<()> {
        let bucket = &self.settings.bucket_name;

        if self.store.bucket_exists(bucket).await? {
            info!("Bucket {} exists", bucket);
            return Ok(());
        }

        info!("Creating bucket {} in {}...", bucket, self.region);
        match self.store.create_bucket(bucket, &self.region).await? {
            BucketCreation::Created => info!("Created bucket {}", bucket),
            BucketCreation::AlreadyOwned => info!("Bucket {} is already owned by you", bucket),
            BucketCreation::OwnedByOther => {
                return Err(UploadError::provisioning(
                    format!("bucket '{}'", bucket),
                    "the name is taken by another account; choose a different bucket name",
                ))
            }
        }
        Ok(())
    }

    async fn upload_all(&self, inputs: &[(DatasetKind, PathBuf)]) -> Result<ObjectRunReport> {
        let format = self.settings.output_format;
        let converter = FormatConverter::new(format).with_json_indent(self.settings.json_indent);
        let mut summary = UploadSummary::new(
            &self.settings.bucket_name,
            format,
            self.settings.json_indent,
            &self.run_timestamp,
        );

        let progress = ProgressReporter::new(inputs.len() as u64, "Uploading datasets", self.quiet);
        let reader = TableReader::new();

        for (kind, path) in inputs {
            progress.set_message(&format!("Uploading {} data", kind));

            let table = match reader.read_file(path) {
                Ok(table) => table,
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            };

            // A failed object stops the run; later files are not attempted
            let key = match self.upload_dataset(*kind, path, &table, &converter).await {
                Ok(key) => key,
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            };

            summary.add_file(FileSummary::from_table(*kind, path, &key, &table));
            progress.increment(1);
        }

        let summary_key = self.upload_summary(&summary).await?;
        progress.finish_with_message(&format!(
            "Uploaded {} files ({} records)",
            summary.files_uploaded.len(),
            summary.total_records
        ));

        Ok(ObjectRunReport {
            summary,
            summary_key,
        })
    }

    /// Convert one dataset and put it under a run-timestamped key
    pub async fn upload_dataset(
        &self,
        kind: DatasetKind,
        path: &Path,
        table: &DataTable,
        converter: &FormatConverter,
    ) -> Result<String> {
        let format = converter.format();
        let body = converter.convert(table)?;
        let key = data_object_key(
            &self.settings.key_prefix,
            &self.settings.object_basename,
            kind.as_str(),
            &self.run_timestamp,
            format.extension(),
        );

        let original_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut metadata = BTreeMap::new();
        metadata.insert("upload_timestamp".to_string(), upload_timestamp());
        metadata.insert("original_filename".to_string(), original_filename);
        metadata.insert("content_size".to_string(), body.len().to_string());
        metadata.insert("format".to_string(), format.as_str().to_string());

        let size = body.len();
        self.put(key.clone(), body, format.content_type(), metadata)
            .await?;

        info!(
            "Uploaded {} records ({} bytes) to s3://{}/{}",
            table.len(),
            size,
            self.settings.bucket_name,
            key
        );
        Ok(key)
    }

    /// Persist the run summary as pretty JSON next to the data objects
    pub async fn upload_summary(&self, summary: &UploadSummary) -> Result<String> {
        let key = summary_object_key(&self.settings.key_prefix, &self.run_timestamp);
        let body = summary.to_json()?.into_bytes();

        let mut metadata = BTreeMap::new();
        metadata.insert("upload_timestamp".to_string(), upload_timestamp());
        metadata.insert("content_size".to_string(), body.len().to_string());
        metadata.insert(
            "format".to_string(),
            self.settings.output_format.as_str().to_string(),
        );

        self.put(key.clone(), body, "application/json", metadata)
            .await?;
        info!("Upload summary saved to s3://{}/{}", self.settings.bucket_name, key);
        Ok(key)
    }

    async fn put(
        &self,
        key: String,
        body: Vec<u8>,
        content_type: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        let request = PutObjectRequest {
            bucket: self.settings.bucket_name.clone(),
            key: key.clone(),
            body,
            content_type: content_type.to_string(),
            metadata,
        };

        self.store.put_object(request).await.map_err(|e| match e {
            UploadError::ObjectUpload { .. } => e,
            other => UploadError::ObjectUpload {
                key,
                message: other.to_string(),
            },
        })
    }
}

fn upload_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::writers::{MemoryBlobStore, OutputFormat};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    const QUARTERLY: &str = "city_name,country,YEAR,ADJUSTED_QUARTER,TAVG\n\
                             Hanoi,Vietnam,2019,Q1,17.2\n\
                             Hanoi,Vietnam,2019,Q2,29.0\n";
    const MONTHLY: &str = "city_name,country,YEAR,MONTH,SEASON,TAVG\n\
                           Hanoi,Vietnam,2019,1,Winter,16.4\n\
                           Hanoi,Vietnam,2019,7,Summer,\n";

    fn fixture(dir: &TempDir, format: OutputFormat) -> ObjectSettings {
        let quarterly = dir.path().join("quarterly.csv");
        let monthly = dir.path().join("monthly.csv");
        fs::write(&quarterly, QUARTERLY).unwrap();
        fs::write(&monthly, MONTHLY).unwrap();

        ObjectSettings {
            bucket_name: "test-climate-bucket".to_string(),
            quarterly_input: quarterly,
            monthly_input: monthly,
            output_format: format,
            ..Settings::default().objects
        }
    }

    fn timestamp(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, second).unwrap()
    }

    fn uploader(store: MemoryBlobStore, settings: ObjectSettings) -> ObjectUploader<MemoryBlobStore> {
        ObjectUploader::connect(store, settings, "eu-central-1")
            .unwrap()
            .with_run_timestamp(timestamp(0))
            .with_quiet(true)
    }

    #[tokio::test]
    async fn test_uploads_both_datasets_and_summary() -> Result<()> {
        let dir = TempDir::new()?;
        let mut uploader = uploader(MemoryBlobStore::new(), fixture(&dir, OutputFormat::Json));

        let report = uploader.run(DatasetMode::Both).await?;
        let store = uploader.store();

        assert!(store.has_bucket("test-climate-bucket"));
        assert_eq!(report.summary.total_records, 4);
        assert_eq!(
            report.summary_key,
            "climate-data/upload_summary_20240601_120000_000000.json"
        );

        let monthly = store
            .object(
                "test-climate-bucket",
                "climate-data/climate_famous300_cities_monthly_20240601_120000_000000.json",
            )
            .expect("monthly object");
        assert_eq!(monthly.content_type, "application/json");
        assert_eq!(monthly.metadata["original_filename"], "monthly.csv");
        assert_eq!(monthly.metadata["format"], "json");
        assert_eq!(monthly.metadata["content_size"], monthly.body.len().to_string());

        let records: serde_json::Value = serde_json::from_slice(&monthly.body)?;
        assert_eq!(records[1]["TAVG"], serde_json::Value::Null);

        assert_eq!(store.keys("test-climate-bucket").len(), 3);
        assert_eq!(uploader.state(), UploadState::Done);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_metadata_names_run_format() -> Result<()> {
        let dir = TempDir::new()?;
        let mut uploader = uploader(MemoryBlobStore::new(), fixture(&dir, OutputFormat::JsonLines));

        let report = uploader.run(DatasetMode::Monthly).await?;
        let summary = uploader
            .store()
            .object("test-climate-bucket", &report.summary_key)
            .expect("summary object");

        assert_eq!(summary.content_type, "application/json");
        assert_eq!(summary.metadata["format"], "jsonl");
        assert_eq!(summary.metadata["content_size"], summary.body.len().to_string());
        assert!(summary.metadata.contains_key("upload_timestamp"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rerun_never_overwrites() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = fixture(&dir, OutputFormat::Csv);
        let store = MemoryBlobStore::new();

        let mut first = uploader(store, settings.clone());
        first.run(DatasetMode::Monthly).await?;
        let store = first.into_store();

        let mut second = ObjectUploader::connect(store, settings, "eu-central-1")?
            .with_run_timestamp(timestamp(1))
            .with_quiet(true);
        second.run(DatasetMode::Monthly).await?;

        let keys = second.store().keys("test-climate-bucket");
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().any(|k| k.ends_with("_monthly_20240601_120000_000000.csv")));
        assert!(keys.iter().any(|k| k.ends_with("_monthly_20240601_120001_000000.csv")));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() -> Result<()> {
        let dir = TempDir::new()?;
        let mut settings = fixture(&dir, OutputFormat::JsonLines);
        settings.quarterly_input = dir.path().join("absent.csv");
        let mut uploader = uploader(MemoryBlobStore::new(), settings);

        let report = uploader.run(DatasetMode::Both).await?;

        assert_eq!(report.summary.files_uploaded.len(), 1);
        assert_eq!(report.summary.files_uploaded[0].data_type, DatasetKind::Monthly);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_input_files_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut settings = fixture(&dir, OutputFormat::Json);
        settings.monthly_input = dir.path().join("absent.csv");
        let mut uploader = uploader(MemoryBlobStore::new(), settings);

        let result = uploader.run(DatasetMode::Monthly).await;

        assert!(matches!(result, Err(UploadError::InputFileMissing(_))));
        assert!(!uploader.store().has_bucket("test-climate-bucket"));
    }

    #[tokio::test]
    async fn test_foreign_bucket_fails() {
        let dir = TempDir::new().unwrap();
        let store = MemoryBlobStore::new().with_foreign_bucket("test-climate-bucket");
        let mut uploader = uploader(store, fixture(&dir, OutputFormat::Json));

        let result = uploader.run(DatasetMode::Monthly).await;

        assert!(matches!(result, Err(UploadError::ResourceProvisioning { .. })));
        assert_eq!(uploader.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn test_failed_object_skips_remaining_files_and_summary() {
        let dir = TempDir::new().unwrap();
        let store = MemoryBlobStore::new().failing_on_put(1);
        let mut uploader = uploader(store, fixture(&dir, OutputFormat::Json));

        let result = uploader.run(DatasetMode::Both).await;

        assert!(matches!(result, Err(UploadError::ObjectUpload { .. })));
        assert!(uploader.store().keys("test-climate-bucket").is_empty());
        assert_eq!(uploader.state(), UploadState::Failed);
    }
}

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::{Result, UploadError};
use crate::models::DatasetMode;
use crate::reporters::{ObjectRunReport, TableRunReport};
use crate::uploaders::{ObjectUploader, TableUploader};
use crate::utils::logging::init_logging;
use crate::writers::{
    load_sdk_config, BlobStore, DynamoTableStore, MemoryBlobStore, MemoryTableStore,
    OutputFormat, S3BlobStore, TableStore,
};
use std::time::Duration;
use tracing::{error, info, warn};
use validator::Validate;

/// Settings after applying command-line overrides on top of file and environment
struct Invocation {
    settings: Settings,
    mode: Option<DatasetMode>,
    quiet: bool,
    dry_run: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config,
        verbose,
        log_file,
        quiet,
        dry_run,
    } = cli;

    // Argument values are checked before configuration or network access
    let (mode, format) = match &command {
        Commands::Objects { mode, format, .. } => (
            mode.as_deref().map(str::parse::<DatasetMode>).transpose()?,
            format.as_deref().map(str::parse::<OutputFormat>).transpose()?,
        ),
        Commands::Table { .. } => (None, None),
    };

    let mut settings = Settings::load(config.as_deref())?;
    if log_file.is_some() {
        settings.logging.file = log_file;
    }

    match &command {
        Commands::Table {
            input,
            table_name,
            batch_size,
            strict,
        } => {
            if let Some(input) = input {
                settings.table.input_file = input.clone();
            }
            if let Some(name) = table_name {
                settings.table.table_name = name.clone();
            }
            if let Some(size) = batch_size {
                settings.table.batch_size = *size;
            }
            if *strict {
                settings.table.strict_numeric = true;
            }
        }
        Commands::Objects { bucket, .. } => {
            if let Some(format) = format {
                settings.objects.output_format = format;
            }
            if let Some(bucket) = bucket {
                settings.objects.bucket_name = bucket.clone();
            }
        }
    }
    settings.validate()?;

    let _guard = init_logging(&settings.logging, verbose)?;

    let invocation = Invocation {
        settings,
        mode,
        quiet,
        dry_run,
    };

    let work = async {
        match command {
            Commands::Table { .. } => run_table(&invocation).await,
            Commands::Objects { .. } => run_objects(&invocation).await,
        }
    };

    let result = tokio::select! {
        result = work => result,
        _ = interrupted() => {
            warn!("Interrupted; aborting upload");
            Err(UploadError::Cancelled)
        }
    };

    // Logged while the run's subscriber is still installed
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run_table(invocation: &Invocation) -> Result<()> {
    let settings = &invocation.settings;
    let input = &settings.table.input_file;

    if !input.is_file() {
        return Err(UploadError::InputFileMissing(input.clone()));
    }

    println!("Uploading city climate profiles...");
    println!("Input file: {}", input.display());
    println!(
        "Table: {} (region {})",
        settings.table.table_name, settings.aws.region
    );

    let report = if invocation.dry_run {
        info!("Dry run: writing to an in-memory table");
        upload_table(MemoryTableStore::new(), invocation).await?
    } else {
        let sdk_config = load_sdk_config(&settings.aws).await?;
        upload_table(DynamoTableStore::new(&sdk_config), invocation).await?
    };

    println!("\n{}", report.summary());
    Ok(())
}

async fn upload_table<S: TableStore>(store: S, invocation: &Invocation) -> Result<TableRunReport> {
    let settings = &invocation.settings;
    let mut uploader =
        TableUploader::connect(store, settings.table.clone(), &settings.aws.region)?
            .with_quiet(invocation.quiet);

    if invocation.dry_run {
        uploader = uploader.with_poll_interval(Duration::from_millis(1));
    }

    uploader.run(&settings.table.input_file).await
}

async fn run_objects(invocation: &Invocation) -> Result<()> {
    let settings = &invocation.settings;
    let objects = &settings.objects;
    let mode = invocation.mode.unwrap_or(objects.data_type);

    // Fail on absent inputs before connecting
    let inputs: Vec<_> = mode.datasets().iter().map(|&k| objects.input_for(k)).collect();
    if !inputs.iter().any(|path| path.is_file()) {
        if let Some(path) = inputs.first() {
            return Err(UploadError::InputFileMissing(path.to_path_buf()));
        }
    }

    println!("Uploading {} climate data...", mode);
    println!(
        "Bucket: {} (region {}), format: {}",
        objects.bucket_name, settings.aws.region, objects.output_format
    );

    let report = if invocation.dry_run {
        info!("Dry run: writing to an in-memory bucket");
        upload_objects(MemoryBlobStore::new(), mode, invocation).await?
    } else {
        let sdk_config = load_sdk_config(&settings.aws).await?;
        let store = match settings.aws.endpoint_url {
            Some(_) => S3BlobStore::with_path_style(&sdk_config),
            None => S3BlobStore::new(&sdk_config),
        };
        upload_objects(store, mode, invocation).await?
    };

    println!("\n{}", report.display());
    println!("Upload complete!");
    Ok(())
}

async fn upload_objects<B: BlobStore>(
    store: B,
    mode: DatasetMode,
    invocation: &Invocation,
) -> Result<ObjectRunReport> {
    let settings = &invocation.settings;
    let mut uploader =
        ObjectUploader::connect(store, settings.objects.clone(), &settings.aws.region)?
            .with_quiet(invocation.quiet);

    uploader.run(mode).await
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "climate-upload")]
#[command(about = "Upload city climate datasets to DynamoDB tables and S3 objects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Configuration file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress output")]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        help = "Run against in-memory targets without any network calls"
    )]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload city climate profiles to the key-value table
    Table {
        #[arg(short, long, help = "Input CSV file [default: city_climate_profiles.csv]")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Destination table name")]
        table_name: Option<String>,

        #[arg(short, long, help = "Items per bulk write (1-25)")]
        batch_size: Option<usize>,

        #[arg(long, help = "Fail on malformed numeric fields instead of writing zero")]
        strict: bool,
    },

    /// Upload climate datasets to the object store
    Objects {
        /// Datasets to upload: quarterly, monthly or both
        mode: Option<String>,

        #[arg(short, long, help = "Output format: json, jsonl or csv")]
        format: Option<String>,

        #[arg(long, help = "Destination bucket name")]
        bucket: Option<String>,
    },
}

//! MDP Ingest - dataset loading tool

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use mdp_common::logging::{init_logging, LogConfig, LogLevel};
use mdp_ingest::ingest::{ingest_with_options, LOAD_ORDER};
use mdp_ingest::IngestOptions;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mdp-ingest")]
#[command(author, version, about = "MDP dataset ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Load the dataset dumps into the database
    Load {
        /// Directory containing the .tsv dump files
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// PostgreSQL connection string
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        /// Rows per upsert batch
        #[arg(long, default_value_t = 1000)]
        batch_size: usize,

        /// Cap accepted rows per table (smoke runs against full dumps)
        #[arg(long)]
        limit: Option<usize>,

        /// Emit the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report table row counts and recorded load progress
    Status {
        /// PostgreSQL connection string
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    init_logging(&log_config)?;

    match cli.command {
        Command::Load {
            data_dir,
            database_url,
            batch_size,
            limit,
            json,
        } => run_load(&data_dir, &database_url, batch_size, limit, json).await,
        Command::Status { database_url, json } => run_status(&database_url, json).await,
    }
}

async fn connect(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to database")
}

async fn run_load(
    data_dir: &Path,
    database_url: &str,
    batch_size: usize,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    if !data_dir.is_dir() {
        bail!("dataset directory does not exist: {}", data_dir.display());
    }

    // Report which dump files are present. Missing files are tolerated by
    // the loaders; their tables just stay empty.
    for dataset in LOAD_ORDER {
        if data_dir.join(dataset.file_name()).exists() {
            info!(file = dataset.file_name(), "Found dataset file");
        } else {
            warn!(
                file = dataset.file_name(),
                "Dataset file missing, its table will stay empty"
            );
        }
    }

    let pool = connect(database_url).await?;

    let mut options = IngestOptions::new().with_batch_size(batch_size);
    if let Some(limit) = limit {
        options = options.with_parse_limit(limit);
    }

    let report = ingest_with_options(data_dir, &pool, &options).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!("{}", report.summary());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct TableStatus {
    table: &'static str,
    rows: i64,
    loaded_rows: Option<i64>,
    completed_at: Option<DateTime<Utc>>,
}

async fn run_status(database_url: &str, json: bool) -> Result<()> {
    let pool = connect(database_url).await?;

    let markers: Vec<(String, i64, DateTime<Utc>)> =
        sqlx::query_as("SELECT table_name, rows_loaded, completed_at FROM ingest_progress")
            .fetch_all(&pool)
            .await
            .context("failed to read load progress (has `mdp-ingest load` run yet?)")?;

    let mut statuses = Vec::new();
    for dataset in LOAD_ORDER {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", dataset.table()))
            .fetch_one(&pool)
            .await
            .with_context(|| format!("failed to count {}", dataset.table()))?;

        let marker = markers.iter().find(|(name, _, _)| name == dataset.table());
        statuses.push(TableStatus {
            table: dataset.table(),
            rows,
            loaded_rows: marker.map(|(_, loaded, _)| *loaded),
            completed_at: marker.map(|(_, _, at)| *at),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        for status in &statuses {
            info!(
                table = status.table,
                rows = status.rows,
                loaded_rows = status.loaded_rows,
                completed_at = ?status.completed_at,
                "Table status"
            );
        }
    }

    Ok(())
}

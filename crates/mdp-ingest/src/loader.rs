//! Streaming table loader
//!
//! One loader invocation owns the full lifecycle for a single dataset file:
//! open, skip the header, stream every line through the parser into the
//! batch writer, flush the tail. The file is never materialized in memory.

use std::path::Path;

use mdp_common::{MdpError, Result};
use sqlx::PgPool;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::batch::{BatchWriter, TableRecord};
use crate::config::IngestOptions;
use crate::parser::{parse_line, FromTsv};

fn read_error(path: &Path, source: std::io::Error) -> MdpError {
    MdpError::DatasetRead {
        path: path.display().to_string(),
        source,
    }
}

/// Stream one dataset file into its table and return the accepted-row count.
///
/// A missing file is tolerated: the loader logs and reports zero rows, and
/// the run continues. An I/O or database error mid-stream aborts the loader
/// and propagates; batches flushed before the failure stay committed, so a
/// mid-file failure can leave the table partially loaded.
pub async fn load_table<R>(pool: &PgPool, path: &Path, options: &IngestOptions) -> Result<u64>
where
    R: FromTsv + TableRecord,
{
    if !path.exists() {
        warn!(
            table = R::TABLE,
            path = %path.display(),
            "Dataset file not found, skipping table"
        );
        return Ok(0);
    }

    info!(table = R::TABLE, path = %path.display(), "Loading table");

    let file = File::open(path)
        .await
        .map_err(|source| read_error(path, source))?;
    let mut lines = BufReader::new(file).lines();

    // Every dump file carries exactly one header line.
    if lines
        .next_line()
        .await
        .map_err(|source| read_error(path, source))?
        .is_none()
    {
        warn!(table = R::TABLE, "Dataset file is empty");
        return Ok(0);
    }

    let mut writer = BatchWriter::<R>::new(pool, options.batch_size);
    let mut dropped = 0u64;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|source| read_error(path, source))?
    {
        match parse_line::<R>(&line) {
            Some(record) => {
                writer.add(record).await?;
                if let Some(limit) = options.parse_limit {
                    if writer.accepted() >= limit as u64 {
                        warn!(
                            table = R::TABLE,
                            limit, "Parse limit reached, ignoring the rest of the file"
                        );
                        break;
                    }
                }
            },
            None => dropped += 1,
        }
    }

    writer.flush().await?;

    let accepted = writer.accepted();
    info!(
        table = R::TABLE,
        rows = accepted,
        dropped = dropped,
        "Table loaded"
    );
    Ok(accepted)
}

//! MDP Ingest Library
//!
//! Loads the tab-separated movie dataset dumps into PostgreSQL: streaming
//! parse, batched conflict-tolerant upserts, and dependency-ordered loading
//! so foreign keys resolve without deferred constraints. Re-running
//! ingestion against the same files is a no-op after the first successful
//! pass.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use mdp_ingest::ingest;
//! use sqlx::postgres::PgPoolOptions;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = PgPoolOptions::new()
//!         .connect("postgres://localhost/mdp")
//!         .await?;
//!
//!     let report = ingest(Path::new("./data"), &pool).await?;
//!     tracing::info!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod parser;
pub mod schema;

// Re-export the public entry points
pub use config::IngestOptions;
pub use ingest::{ingest, ingest_with_options, Dataset, IngestReport, RowCounts, LOAD_ORDER};

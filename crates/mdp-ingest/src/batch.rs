//! Batched conflict-tolerant upserts
//!
//! Records are staged in a bounded buffer and written as one grouped
//! `INSERT ... ON CONFLICT ... DO NOTHING` statement per flush. Conflict
//! tolerance on the natural key makes a repeated load of the same file a
//! no-op after the first successful pass, and the bounded stage keeps at
//! most one batch per table resident in memory.

use mdp_common::Result;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::models::{AkaRecord, NameRecord, PrincipalRecord, TitleRecord};

/// Rows staged per upsert statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A record that maps onto one dataset table.
pub trait TableRecord: Send + Sync {
    /// Target table name.
    const TABLE: &'static str;

    /// `INSERT INTO <table> (<columns>) ` prefix, ending before `VALUES`.
    const INSERT_PREFIX: &'static str;

    /// ` ON CONFLICT (<natural key>) DO NOTHING` suffix.
    const CONFLICT_CLAUSE: &'static str;

    /// Bind this record as one row of a multi-row `VALUES` list.
    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>);
}

/// Stages records for one table and flushes them in fixed-size batches.
///
/// The final [`flush`](BatchWriter::flush) at end-of-input is mandatory:
/// the tail batch holds up to `batch_size - 1` rows.
pub struct BatchWriter<'a, R: TableRecord> {
    pool: &'a PgPool,
    stage: Vec<R>,
    batch_size: usize,
    accepted: u64,
}

impl<'a, R: TableRecord> BatchWriter<'a, R> {
    pub fn new(pool: &'a PgPool, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            pool,
            stage: Vec::with_capacity(batch_size),
            batch_size,
            accepted: 0,
        }
    }

    /// Total rows accepted so far, staged or flushed.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Rows currently staged and not yet written.
    pub fn pending(&self) -> usize {
        self.stage.len()
    }

    /// Stage one record, flushing when the stage reaches the batch size.
    pub async fn add(&mut self, record: R) -> Result<()> {
        self.stage.push(record);
        self.accepted += 1;
        if self.stage.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Write all staged rows as one grouped upsert and clear the stage.
    ///
    /// A no-op on an empty stage, so calling it once more at end-of-input
    /// is always safe.
    pub async fn flush(&mut self) -> Result<()> {
        if self.stage.is_empty() {
            return Ok(());
        }
        let staged = self.stage.len();

        let mut query = QueryBuilder::<Postgres>::new(R::INSERT_PREFIX);
        query.push_values(self.stage.drain(..), |mut row, record| {
            record.bind(&mut row);
        });
        query.push(R::CONFLICT_CLAUSE);

        let result = query.build().execute(self.pool).await?;

        debug!(
            table = R::TABLE,
            staged = staged,
            inserted = result.rows_affected(),
            total = self.accepted,
            "Flushed batch"
        );
        Ok(())
    }
}

impl TableRecord for NameRecord {
    const TABLE: &'static str = "name_basics";
    const INSERT_PREFIX: &'static str = "INSERT INTO name_basics \
        (nconst, primary_name, birth_year, death_year, primary_profession, known_for_titles) ";
    const CONFLICT_CLAUSE: &'static str = " ON CONFLICT (nconst) DO NOTHING";

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.nconst)
            .push_bind(self.primary_name)
            .push_bind(self.birth_year)
            .push_bind(self.death_year)
            .push_bind(self.primary_profession)
            .push_bind(self.known_for_titles);
    }
}

impl TableRecord for TitleRecord {
    const TABLE: &'static str = "title_basics";
    const INSERT_PREFIX: &'static str = "INSERT INTO title_basics \
        (tconst, title_type, primary_title, original_title, is_adult, \
        start_year, end_year, runtime_minutes, genres) ";
    const CONFLICT_CLAUSE: &'static str = " ON CONFLICT (tconst) DO NOTHING";

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.tconst)
            .push_bind(self.title_type)
            .push_bind(self.primary_title)
            .push_bind(self.original_title)
            .push_bind(self.is_adult)
            .push_bind(self.start_year)
            .push_bind(self.end_year)
            .push_bind(self.runtime_minutes)
            .push_bind(self.genres);
    }
}

impl TableRecord for PrincipalRecord {
    const TABLE: &'static str = "title_principals";
    const INSERT_PREFIX: &'static str = "INSERT INTO title_principals \
        (tconst, ordering, nconst, category, job, characters) ";
    const CONFLICT_CLAUSE: &'static str = " ON CONFLICT (tconst, ordering) DO NOTHING";

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.tconst)
            .push_bind(self.ordering)
            .push_bind(self.nconst)
            .push_bind(self.category)
            .push_bind(self.job)
            .push_bind(self.characters);
    }
}

impl TableRecord for AkaRecord {
    const TABLE: &'static str = "title_akas";
    const INSERT_PREFIX: &'static str = "INSERT INTO title_akas \
        (title_id, ordering, title, region, language, types, attributes, is_original_title) ";
    const CONFLICT_CLAUSE: &'static str = " ON CONFLICT (title_id, ordering) DO NOTHING";

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.title_id)
            .push_bind(self.ordering)
            .push_bind(self.title)
            .push_bind(self.region)
            .push_bind(self.language)
            .push_bind(self.types)
            .push_bind(self.attributes)
            .push_bind(self.is_original_title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // A lazy pool never dials the database until a query runs, so staging
    // behavior is testable without a live server.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://mdp@localhost/mdp_test")
            .unwrap()
    }

    fn sample_name(id: &str) -> NameRecord {
        NameRecord {
            nconst: id.to_string(),
            primary_name: Some("Someone".to_string()),
            birth_year: None,
            death_year: None,
            primary_profession: None,
            known_for_titles: None,
        }
    }

    #[tokio::test]
    async fn test_add_stages_without_flushing_below_threshold() {
        let pool = lazy_pool();
        let mut writer = BatchWriter::<NameRecord>::new(&pool, 10);

        for i in 0..9 {
            writer.add(sample_name(&format!("nm{:07}", i))).await.unwrap();
        }

        assert_eq!(writer.pending(), 9);
        assert_eq!(writer.accepted(), 9);
    }

    #[tokio::test]
    async fn test_add_flushes_exactly_at_the_threshold() {
        // nothing listens on port 1, so the first statement that actually
        // reaches for a connection fails; adds below the threshold never do
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://mdp@localhost:1/mdp_test")
            .unwrap();
        let mut writer = BatchWriter::<NameRecord>::new(&pool, 3);

        writer.add(sample_name("nm0000001")).await.unwrap();
        writer.add(sample_name("nm0000002")).await.unwrap();
        assert_eq!(writer.pending(), 2);

        // the third add crosses the threshold and attempts the flush
        assert!(writer.add(sample_name("nm0000003")).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_flush_is_a_no_op() {
        let pool = lazy_pool();
        let mut writer = BatchWriter::<TitleRecord>::new(&pool, 10);

        // must not touch the database at all
        writer.flush().await.unwrap();
        assert_eq!(writer.accepted(), 0);
    }

    #[test]
    fn test_insert_statements_target_the_natural_keys() {
        assert!(NameRecord::CONFLICT_CLAUSE.contains("(nconst)"));
        assert!(TitleRecord::CONFLICT_CLAUSE.contains("(tconst)"));
        assert!(PrincipalRecord::CONFLICT_CLAUSE.contains("(tconst, ordering)"));
        assert!(AkaRecord::CONFLICT_CLAUSE.contains("(title_id, ordering)"));

        for clause in [
            NameRecord::CONFLICT_CLAUSE,
            TitleRecord::CONFLICT_CLAUSE,
            PrincipalRecord::CONFLICT_CLAUSE,
            AkaRecord::CONFLICT_CLAUSE,
        ] {
            assert!(clause.ends_with("DO NOTHING"));
        }
    }

    #[test]
    fn test_insert_prefixes_name_their_tables() {
        assert!(NameRecord::INSERT_PREFIX.starts_with("INSERT INTO name_basics"));
        assert!(TitleRecord::INSERT_PREFIX.starts_with("INSERT INTO title_basics"));
        assert!(PrincipalRecord::INSERT_PREFIX.starts_with("INSERT INTO title_principals"));
        assert!(AkaRecord::INSERT_PREFIX.starts_with("INSERT INTO title_akas"));
    }
}

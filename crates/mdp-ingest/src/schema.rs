//! Idempotent schema setup
//!
//! Every statement is `CREATE ... IF NOT EXISTS`, so running this on every
//! process start is a no-op after the first. Parent tables are declared
//! before the tables whose foreign keys reference them.

use mdp_common::Result;
use sqlx::PgPool;
use tracing::{debug, info};

/// DDL statements in execution order. `name_basics` and `title_basics`
/// must precede `title_principals` and `title_akas` so the foreign keys
/// resolve on a fresh database.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS name_basics (
        nconst VARCHAR(20) PRIMARY KEY,
        primary_name TEXT,
        birth_year INTEGER,
        death_year INTEGER,
        primary_profession TEXT,
        known_for_titles TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS title_basics (
        tconst VARCHAR(20) PRIMARY KEY,
        title_type VARCHAR(50),
        primary_title TEXT,
        original_title TEXT,
        is_adult BOOLEAN,
        start_year INTEGER,
        end_year INTEGER,
        runtime_minutes INTEGER,
        genres TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS title_principals (
        tconst VARCHAR(20),
        ordering INTEGER,
        nconst VARCHAR(20),
        category VARCHAR(50),
        job TEXT,
        characters TEXT,
        PRIMARY KEY (tconst, ordering),
        FOREIGN KEY (tconst) REFERENCES title_basics (tconst),
        FOREIGN KEY (nconst) REFERENCES name_basics (nconst)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS title_akas (
        title_id VARCHAR(20),
        ordering INTEGER,
        title TEXT,
        region VARCHAR(10),
        language VARCHAR(10),
        types TEXT,
        attributes TEXT,
        is_original_title BOOLEAN,
        PRIMARY KEY (title_id, ordering),
        FOREIGN KEY (title_id) REFERENCES title_basics (tconst)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ingest_progress (
        table_name VARCHAR(64) PRIMARY KEY,
        rows_loaded BIGINT NOT NULL,
        completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_title_basics_type ON title_basics (title_type)",
    "CREATE INDEX IF NOT EXISTS idx_title_basics_year ON title_basics (start_year)",
    "CREATE INDEX IF NOT EXISTS idx_title_basics_title ON title_basics (primary_title)",
    "CREATE INDEX IF NOT EXISTS idx_title_principals_tconst ON title_principals (tconst)",
    "CREATE INDEX IF NOT EXISTS idx_title_principals_nconst ON title_principals (nconst)",
    "CREATE INDEX IF NOT EXISTS idx_title_principals_category ON title_principals (category)",
    "CREATE INDEX IF NOT EXISTS idx_name_basics_name ON name_basics (primary_name)",
];

/// Ensure all dataset tables and secondary indexes exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    info!("Ensuring dataset schema");

    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    debug!(
        statements = SCHEMA_STATEMENTS.len(),
        "Schema statements applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_of(fragment: &str) -> usize {
        SCHEMA_STATEMENTS
            .iter()
            .position(|s| s.contains(fragment))
            .unwrap()
    }

    #[test]
    fn test_every_statement_is_idempotent_ddl() {
        for statement in SCHEMA_STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "not idempotent: {statement}");
        }
    }

    #[test]
    fn test_parents_are_declared_before_children() {
        let names = position_of("name_basics (\n");
        let titles = position_of("title_basics (\n");
        let principals = position_of("title_principals (\n");
        let akas = position_of("title_akas (\n");

        assert!(names < principals);
        assert!(titles < principals);
        assert!(titles < akas);
    }

    #[test]
    fn test_all_five_tables_and_seven_indexes() {
        let tables = SCHEMA_STATEMENTS
            .iter()
            .filter(|s| s.contains("CREATE TABLE"))
            .count();
        let indexes = SCHEMA_STATEMENTS
            .iter()
            .filter(|s| s.contains("CREATE INDEX"))
            .count();

        assert_eq!(tables, 5);
        assert_eq!(indexes, 7);
    }
}

//! Ingestion run options

use crate::batch::DEFAULT_BATCH_SIZE;

/// Options for one ingestion run.
///
/// The core takes no configuration beyond the dataset directory and the
/// connection pool; these knobs exist for the CLI and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Rows staged per upsert statement.
    pub batch_size: usize,
    /// Optional cap on accepted rows per table, for smoke runs against
    /// multi-million-row dumps. `None` loads everything.
    pub parse_limit: Option<usize>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parse_limit: None,
        }
    }
}

impl IngestOptions {
    /// Create options with the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rows-per-batch threshold (clamped to at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Cap accepted rows per table
    pub fn with_parse_limit(mut self, limit: usize) -> Self {
        self.parse_limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = IngestOptions::default();
        assert_eq!(options.batch_size, 1000);
        assert_eq!(options.parse_limit, None);
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let options = IngestOptions::new().with_batch_size(0);
        assert_eq!(options.batch_size, 1);
    }

    #[test]
    fn test_with_parse_limit() {
        let options = IngestOptions::new().with_parse_limit(500);
        assert_eq!(options.parse_limit, Some(500));
    }
}

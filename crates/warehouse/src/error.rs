use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Dataset operation failed for '{dataset}': {source}")]
    Dataset {
        dataset: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Table operation failed for '{table}': {source}")]
    Table {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Row insert failed for '{table}': {source}")]
    Insert {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Load job submission failed for '{table}': {source}")]
    LoadSubmit {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Load job '{job_id}' failed: {reason}")]
    LoadJob { job_id: String, reason: String },

    #[error("Object upload failed for '{path}': {source}")]
    Upload {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl WarehouseError {
    /// Whether a retry of the same call could reasonably succeed.
    /// Submission and transport errors are transient; a failed load job or a
    /// rejected schema change is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WarehouseError::Insert { .. }
                | WarehouseError::LoadSubmit { .. }
                | WarehouseError::Upload { .. }
        )
    }
}

/// Per-row error descriptor returned by a streaming insert. Non-empty
/// results mean some rows were rejected while the rest were committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub index: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        RowError {
            index,
            reason: reason.into(),
        }
    }
}

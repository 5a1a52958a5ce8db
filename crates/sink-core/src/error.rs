use sink_config::error::ConfigError;
use thiserror::Error;
use warehouse::error::WarehouseError;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to provision table '{table}': {source}")]
    Provision {
        table: String,
        #[source]
        source: WarehouseError,
    },

    #[error("Failed to commit batch '{batch_id}': {source}")]
    Commit {
        batch_id: String,
        #[source]
        source: WarehouseError,
    },

    #[error("Load job failed: {0}")]
    LoadJob(#[source] WarehouseError),

    #[error("Failed to encode record for buffering: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Batch payload does not match the strategy encoding")]
    PayloadEncoding,

    #[error("Operation '{operation}' is not valid while the buffer is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Job task failed: {0}")]
    Join(String),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Staged load requires a `bucket` to be configured")]
    MissingBucket,

    #[error("Staged load requires an object store client")]
    MissingObjectStore,

    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },

    #[error("Failed to parse sink settings: {0}")]
    Parse(#[from] serde_json::Error),
}

use crate::error::ConfigError;
use serde::Deserialize;

pub mod validated;

pub use validated::{ValidatedSettings, ValidatedSettingsBuilder};

/// Which delivery strategy commits drained batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Synchronous row inserts against the live table.
    Streaming,
    /// Asynchronous load job reading directly from the batch buffer.
    DirectLoad,
    /// Upload to object storage first, then a load job referencing the URI.
    StagedLoad,
}

/// Raw sink configuration as deserialized from the target's config file.
/// Validated and defaulted into [`ValidatedSettings`] before use.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkSettings {
    /// Service-account credentials for client construction. Consumed by the
    /// process wiring that builds the warehouse and object-store clients;
    /// the sink itself receives clients by injection.
    #[serde(default)]
    pub credentials_path: Option<String>,

    pub project: String,
    pub dataset: String,

    /// Staging bucket; required for the staged load method only.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Object-path prefix for staged batches.
    #[serde(default)]
    pub prefix_override: Option<String>,

    #[serde(default)]
    pub method: Option<DeliveryMethod>,

    /// Job tracker pool size.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Record count that triggers a drain.
    #[serde(default)]
    pub batch_size_limit: Option<usize>,

    /// Per-call timeout, in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Inject `_sdc_*` metadata columns into records and the table schema.
    #[serde(default)]
    pub add_record_metadata: Option<bool>,

    /// Attempts for load-job submission before giving up.
    #[serde(default)]
    pub load_retries: Option<usize>,
}

impl SinkSettings {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<ValidatedSettings, ConfigError> {
        ValidatedSettings::from_settings(self)
    }
}

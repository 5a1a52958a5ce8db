use crate::{
    error::ConfigError,
    settings::{DeliveryMethod, SinkSettings},
};
use std::time::Duration;

pub const DEFAULT_PREFIX: &str = "warehouse-sink";
pub const DEFAULT_THREADS: usize = 8;
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 15_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LOAD_RETRIES: usize = 3;

/// Immutable, validated configuration used throughout the sink.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub project: String,
    pub dataset: String,
    /// Staging bucket; present whenever the method is `StagedLoad`. The sink
    /// itself never reads it: the injected object store is constructed for
    /// this bucket by the process wiring, and validation here guarantees the
    /// wiring has a bucket to use.
    pub bucket: Option<String>,
    /// Object-path prefix for staged batches.
    pub prefix: String,
    pub method: DeliveryMethod,
    /// Job tracker pool size.
    pub threads: usize,
    /// Record count that triggers a drain.
    pub batch_size_limit: usize,
    /// Per-call timeout for inserts and load submissions.
    pub timeout: Duration,
    /// Inject `_sdc_*` metadata columns.
    pub add_record_metadata: bool,
    /// Attempts for load-job submission before giving up.
    pub load_retries: usize,
}

impl ValidatedSettings {
    pub fn from_settings(raw: &SinkSettings) -> Result<Self, ConfigError> {
        let method = raw.method.unwrap_or(DeliveryMethod::Streaming);
        if method == DeliveryMethod::StagedLoad && raw.bucket.is_none() {
            return Err(ConfigError::MissingBucket);
        }

        let threads = raw.threads.unwrap_or(DEFAULT_THREADS);
        if threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threads",
                reason: "must be at least 1".to_string(),
            });
        }

        let batch_size_limit = raw.batch_size_limit.unwrap_or(DEFAULT_BATCH_SIZE_LIMIT);
        if batch_size_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size_limit",
                reason: "must be at least 1".to_string(),
            });
        }

        let load_retries = raw.load_retries.unwrap_or(DEFAULT_LOAD_RETRIES).max(1);

        Ok(ValidatedSettings {
            project: raw.project.clone(),
            dataset: raw.dataset.clone(),
            bucket: raw.bucket.clone(),
            prefix: raw
                .prefix_override
                .clone()
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            method,
            threads,
            batch_size_limit,
            timeout: Duration::from_secs(raw.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            add_record_metadata: raw.add_record_metadata.unwrap_or(false),
            load_retries,
        })
    }

    pub fn builder(project: &str, dataset: &str) -> ValidatedSettingsBuilder {
        ValidatedSettingsBuilder::new(project, dataset)
    }
}

/// Builder used by tests and embedders that construct settings in code.
#[derive(Debug, Clone)]
pub struct ValidatedSettingsBuilder {
    project: String,
    dataset: String,
    bucket: Option<String>,
    prefix: Option<String>,
    method: DeliveryMethod,
    threads: usize,
    batch_size_limit: usize,
    timeout: Duration,
    add_record_metadata: bool,
    load_retries: usize,
}

impl ValidatedSettingsBuilder {
    pub fn new(project: &str, dataset: &str) -> Self {
        ValidatedSettingsBuilder {
            project: project.to_string(),
            dataset: dataset.to_string(),
            bucket: None,
            prefix: None,
            method: DeliveryMethod::Streaming,
            threads: DEFAULT_THREADS,
            batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            add_record_metadata: false,
            load_retries: DEFAULT_LOAD_RETRIES,
        }
    }

    pub fn bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_string());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn method(mut self, method: DeliveryMethod) -> Self {
        self.method = method;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn batch_size_limit(mut self, limit: usize) -> Self {
        self.batch_size_limit = limit;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn add_record_metadata(mut self, enabled: bool) -> Self {
        self.add_record_metadata = enabled;
        self
    }

    pub fn load_retries(mut self, retries: usize) -> Self {
        self.load_retries = retries;
        self
    }

    pub fn build(self) -> Result<ValidatedSettings, ConfigError> {
        if self.method == DeliveryMethod::StagedLoad && self.bucket.is_none() {
            return Err(ConfigError::MissingBucket);
        }
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.batch_size_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size_limit",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ValidatedSettings {
            project: self.project,
            dataset: self.dataset,
            bucket: self.bucket,
            prefix: self.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            method: self.method,
            threads: self.threads,
            batch_size_limit: self.batch_size_limit,
            timeout: self.timeout,
            add_record_metadata: self.add_record_metadata,
            load_retries: self.load_retries.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(method: Option<DeliveryMethod>) -> SinkSettings {
        SinkSettings {
            credentials_path: None,
            project: "acme".to_string(),
            dataset: "raw".to_string(),
            bucket: None,
            prefix_override: None,
            method,
            threads: None,
            batch_size_limit: None,
            timeout: None,
            add_record_metadata: None,
            load_retries: None,
        }
    }

    #[test]
    fn defaults_are_applied() {
        let settings = raw(None).validate().expect("valid settings");
        assert_eq!(settings.method, DeliveryMethod::Streaming);
        assert_eq!(settings.threads, DEFAULT_THREADS);
        assert_eq!(settings.batch_size_limit, 15_000);
        assert_eq!(settings.prefix, DEFAULT_PREFIX);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!settings.add_record_metadata);
    }

    #[test]
    fn staged_load_requires_bucket() {
        let err = raw(Some(DeliveryMethod::StagedLoad))
            .validate()
            .expect_err("bucket is required");
        assert!(matches!(err, ConfigError::MissingBucket));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let mut settings = raw(None);
        settings.threads = Some(0);
        let err = settings.validate().expect_err("threads must be positive");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "threads",
                ..
            }
        ));
    }

    #[test]
    fn settings_parse_from_json() {
        let settings = SinkSettings::from_json(
            r#"{
                "project": "acme",
                "dataset": "raw",
                "method": "staged_load",
                "bucket": "acme-staging",
                "batch_size_limit": 500
            }"#,
        )
        .expect("parse settings");
        let validated = settings.validate().expect("valid settings");
        assert_eq!(validated.method, DeliveryMethod::StagedLoad);
        assert_eq!(validated.bucket.as_deref(), Some("acme-staging"));
        assert_eq!(validated.batch_size_limit, 500);
    }
}

use crate::{
    error::SinkError, jobs::JobTracker, metrics::Metrics, retry::RetryPolicy,
};
use async_trait::async_trait;
use model::{
    batch::{Batch, BatchEncoding, BatchPayload},
    record::Record,
};
use sink_config::{error::ConfigError, settings::{DeliveryMethod, ValidatedSettings}};
use std::sync::Arc;
use warehouse::{client::{LoadOptions, WarehouseClient}, storage::ObjectStore, table::TableRef};

pub mod direct;
pub mod staged;
pub mod streaming;

pub use direct::DirectLoad;
pub use staged::StagedLoad;
pub use streaming::StreamingInsert;

/// Commits drained batches to the warehouse. Implementations choose the
/// in-flight buffer encoding and the completion model; none mutate column
/// definitions.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    /// Encoding for a freshly started batch.
    fn encoding(&self) -> BatchEncoding;

    /// Appends one preprocessed record to the batch payload.
    fn append(&self, batch: &mut Batch, record: Record) -> Result<(), SinkError>;

    /// Commits the drained batch. For asynchronous strategies this returns
    /// once the load job has been submitted, not once it completes.
    async fn commit(&self, batch: &mut Batch, table: &TableRef) -> Result<(), SinkError>;
}

/// Serializes a record as one newline-terminated JSON line.
pub(crate) fn append_ndjson(batch: &mut Batch, record: &Record) -> Result<(), SinkError> {
    let BatchPayload::Ndjson(buf) = &mut batch.payload else {
        return Err(SinkError::PayloadEncoding);
    };
    let line = serde_json::to_vec(record)?;
    buf.extend_from_slice(&line);
    buf.extend_from_slice(b"\n");
    batch.record_count += 1;
    Ok(())
}

/// Builds the strategy selected by configuration. The staged method needs an
/// injected object-store client in addition to the warehouse client.
pub fn create_strategy(
    settings: &ValidatedSettings,
    client: Arc<dyn WarehouseClient>,
    store: Option<Arc<dyn ObjectStore>>,
    tracker: Arc<JobTracker>,
    metrics: Metrics,
) -> Result<Arc<dyn DeliveryStrategy>, SinkError> {
    let options = LoadOptions::new(settings.timeout);
    let retry = RetryPolicy::with_attempts(settings.load_retries);

    Ok(match settings.method {
        DeliveryMethod::Streaming => Arc::new(StreamingInsert::new(
            client,
            settings.timeout,
            metrics,
        )),
        DeliveryMethod::DirectLoad => {
            Arc::new(DirectLoad::new(client, tracker, options, retry, metrics))
        }
        DeliveryMethod::StagedLoad => {
            let store = store.ok_or(SinkError::Config(ConfigError::MissingObjectStore))?;
            Arc::new(StagedLoad::new(
                client,
                store,
                tracker,
                options,
                retry,
                metrics,
                settings.prefix.clone(),
            ))
        }
    })
}

use crate::{
    delivery::{DeliveryStrategy, append_ndjson},
    error::SinkError,
    jobs::JobTracker,
    metrics::Metrics,
    retry::RetryPolicy,
};
use async_trait::async_trait;
use bytes::Bytes;
use model::{
    batch::{Batch, BatchEncoding, BatchPayload},
    record::Record,
};
use std::sync::Arc;
use tracing::info;
use warehouse::{
    client::{LoadOptions, WarehouseClient},
    storage::ObjectStore,
    table::TableRef,
};

/// Uploads the batch to intermediate object storage, then submits a load job
/// referencing the staged object's URI. Routes large payloads around the
/// calling process's memory and network path.
pub struct StagedLoad {
    client: Arc<dyn WarehouseClient>,
    store: Arc<dyn ObjectStore>,
    tracker: Arc<JobTracker>,
    options: LoadOptions,
    retry: RetryPolicy,
    metrics: Metrics,
    prefix: String,
}

impl StagedLoad {
    pub fn new(
        client: Arc<dyn WarehouseClient>,
        store: Arc<dyn ObjectStore>,
        tracker: Arc<JobTracker>,
        options: LoadOptions,
        retry: RetryPolicy,
        metrics: Metrics,
        prefix: String,
    ) -> Self {
        StagedLoad {
            client,
            store,
            tracker,
            options,
            retry,
            metrics,
            prefix,
        }
    }
}

#[async_trait]
impl DeliveryStrategy for StagedLoad {
    fn encoding(&self) -> BatchEncoding {
        BatchEncoding::Ndjson
    }

    fn append(&self, batch: &mut Batch, record: Record) -> Result<(), SinkError> {
        append_ndjson(batch, &record)
    }

    async fn commit(&self, batch: &mut Batch, table: &TableRef) -> Result<(), SinkError> {
        let data = match &batch.payload {
            BatchPayload::Ndjson(buf) => Bytes::from(buf.clone()),
            _ => return Err(SinkError::PayloadEncoding),
        };

        let path = table.staged_object_path(&self.prefix, &batch.id);
        let uri = self
            .retry
            .run(|| {
                let store = self.store.clone();
                let path = path.clone();
                let data = data.clone();
                async move { store.upload(&path, data).await }
            })
            .await
            .map_err(|e| SinkError::Commit {
                batch_id: batch.id.to_string(),
                source: e,
            })?;

        info!(uri = %uri, bytes = data.len(), "Batch staged to object storage");

        let job = self
            .retry
            .run(|| {
                let client = self.client.clone();
                let uri = uri.clone();
                let options = self.options.clone();
                let table = table.clone();
                async move { client.load_from_uri(&table, &uri, &options).await }
            })
            .await
            .map_err(|e| SinkError::Commit {
                batch_id: batch.id.to_string(),
                source: e,
            })?;

        info!(
            table = %table,
            job_id = %job.id(),
            records = batch.record_count,
            "Load job submitted from staged object"
        );

        self.tracker.submit(job).await?;
        self.metrics.increment_jobs(1);

        if let BatchPayload::Ndjson(buf) = &mut batch.payload {
            buf.clear();
        }
        Ok(())
    }
}

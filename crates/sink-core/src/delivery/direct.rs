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
    table::TableRef,
};

/// Submits an asynchronous load job reading newline-delimited records
/// directly from the batch buffer. The buffer is cleared once submission is
/// confirmed; completion is awaited by the job tracker.
pub struct DirectLoad {
    client: Arc<dyn WarehouseClient>,
    tracker: Arc<JobTracker>,
    options: LoadOptions,
    retry: RetryPolicy,
    metrics: Metrics,
}

impl DirectLoad {
    pub fn new(
        client: Arc<dyn WarehouseClient>,
        tracker: Arc<JobTracker>,
        options: LoadOptions,
        retry: RetryPolicy,
        metrics: Metrics,
    ) -> Self {
        DirectLoad {
            client,
            tracker,
            options,
            retry,
            metrics,
        }
    }
}

#[async_trait]
impl DeliveryStrategy for DirectLoad {
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

        let job = self
            .retry
            .run(|| {
                let client = self.client.clone();
                let data = data.clone();
                let options = self.options.clone();
                let table = table.clone();
                async move { client.load_from_buffer(&table, data, &options).await }
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
            bytes = data.len(),
            "Load job submitted from buffer"
        );

        self.tracker.submit(job).await?;
        self.metrics.increment_jobs(1);

        // Submission is confirmed; the buffer can be reclaimed without
        // waiting for the job to complete.
        if let BatchPayload::Ndjson(buf) = &mut batch.payload {
            buf.clear();
        }
        Ok(())
    }
}

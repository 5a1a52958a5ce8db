use crate::{delivery::DeliveryStrategy, error::SinkError, metrics::Metrics};
use async_trait::async_trait;
use model::{
    batch::{Batch, BatchEncoding, BatchPayload},
    record::Record,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use warehouse::{client::WarehouseClient, table::TableRef};

/// Synchronous row inserts against the live table. Lowest latency and
/// row-level visibility, at the cost of partial-failure risk: rejected rows
/// are logged and counted but never retried.
pub struct StreamingInsert {
    client: Arc<dyn WarehouseClient>,
    timeout: Duration,
    metrics: Metrics,
}

impl StreamingInsert {
    pub fn new(client: Arc<dyn WarehouseClient>, timeout: Duration, metrics: Metrics) -> Self {
        StreamingInsert {
            client,
            timeout,
            metrics,
        }
    }
}

#[async_trait]
impl DeliveryStrategy for StreamingInsert {
    fn encoding(&self) -> BatchEncoding {
        BatchEncoding::Rows
    }

    fn append(&self, batch: &mut Batch, record: Record) -> Result<(), SinkError> {
        let BatchPayload::Rows(rows) = &mut batch.payload else {
            return Err(SinkError::PayloadEncoding);
        };
        rows.push(record);
        batch.record_count += 1;
        Ok(())
    }

    async fn commit(&self, batch: &mut Batch, table: &TableRef) -> Result<(), SinkError> {
        let BatchPayload::Rows(rows) = &batch.payload else {
            return Err(SinkError::PayloadEncoding);
        };

        let errors = self
            .client
            .insert_rows(table, rows, self.timeout)
            .await
            .map_err(|e| SinkError::Commit {
                batch_id: batch.id.to_string(),
                source: e,
            })?;

        if errors.is_empty() {
            info!(table = %table, rows = rows.len(), "New rows inserted");
        } else {
            // Rejected rows are dropped, not retried; the count is the only
            // trace they leave.
            warn!(
                table = %table,
                failed = errors.len(),
                errors = ?errors,
                "Rows were rejected during streaming insert"
            );
            self.metrics.increment_rows_dropped(errors.len() as u64);
        }

        Ok(())
    }
}

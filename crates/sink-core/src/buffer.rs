use crate::{
    delivery::DeliveryStrategy, error::SinkError, metrics::Metrics, provision::TableProvisioner,
};
use chrono::{DateTime, Utc};
use model::{batch::Batch, column::ColumnDefinition, record::Record};
use std::sync::Arc;
use tracing::info;
use warehouse::table::TableRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Accumulating,
    Draining,
    Idle,
}

impl BufferState {
    fn name(&self) -> &'static str {
        match self {
            BufferState::Accumulating => "accumulating",
            BufferState::Draining => "draining",
            BufferState::Idle => "idle",
        }
    }
}

/// Per-stream batch accumulation and the drain state machine. One logical
/// writer at a time; transitions are not reentrant, which `&mut self`
/// enforces at compile time.
pub struct BatchBuffer {
    table: TableRef,
    columns: Vec<ColumnDefinition>,
    batch: Batch,
    state: BufferState,
    limit: usize,
    strategy: Arc<dyn DeliveryStrategy>,
    provisioner: Arc<TableProvisioner>,
    metrics: Metrics,
}

impl BatchBuffer {
    pub fn new(
        table: TableRef,
        columns: Vec<ColumnDefinition>,
        limit: usize,
        strategy: Arc<dyn DeliveryStrategy>,
        provisioner: Arc<TableProvisioner>,
        metrics: Metrics,
    ) -> Self {
        let batch = Batch::new(strategy.encoding());
        BatchBuffer {
            table,
            columns,
            batch,
            state: BufferState::Idle,
            limit,
            strategy,
            provisioner,
            metrics,
        }
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn record_count(&self) -> usize {
        self.batch.record_count
    }

    pub fn batch_started_at(&self) -> DateTime<Utc> {
        self.batch.started_at
    }

    /// Appends a preprocessed record in the strategy's encoding. An idle
    /// buffer starts a fresh batch on first accept.
    pub fn accept(&mut self, record: Record) -> Result<(), SinkError> {
        match self.state {
            BufferState::Draining => Err(SinkError::InvalidState {
                operation: "accept",
                state: self.state.name(),
            }),
            BufferState::Idle => {
                self.batch = Batch::new(self.strategy.encoding());
                self.state = BufferState::Accumulating;
                self.strategy.append(&mut self.batch, record)
            }
            BufferState::Accumulating => self.strategy.append(&mut self.batch, record),
        }
    }

    /// Drains when the configured record threshold is met. Returns whether a
    /// drain happened.
    pub async fn maybe_drain(&mut self) -> Result<bool, SinkError> {
        if self.state != BufferState::Accumulating || self.batch.record_count < self.limit {
            return Ok(false);
        }
        self.drain().await?;
        Ok(true)
    }

    /// Drains whatever is buffered, regardless of the threshold. Used at
    /// stream end. An empty batch is a no-op: no provisioning, no delivery.
    pub async fn force_drain(&mut self) -> Result<(), SinkError> {
        if self.batch.is_empty() {
            self.state = BufferState::Idle;
            return Ok(());
        }
        self.drain().await
    }

    /// A failed drain returns the buffer to `Accumulating` with the batch
    /// intact, so records are never stranded and a later drain retries the
    /// whole commit.
    async fn drain(&mut self) -> Result<(), SinkError> {
        self.state = BufferState::Draining;
        let records = self.batch.record_count;

        info!(
            table = %self.table,
            batch_id = %self.batch.id,
            records,
            "Draining batch"
        );

        // Provision once per batch, then hand off to the strategy. "Drained"
        // means the warehouse accepted the submission, not that the load
        // completed.
        if let Err(e) = self.provisioner.ensure(&self.table, &self.columns).await {
            self.metrics.increment_failures(1);
            self.state = BufferState::Accumulating;
            return Err(e);
        }
        if let Err(e) = self.strategy.commit(&mut self.batch, &self.table).await {
            self.metrics.increment_failures(1);
            self.state = BufferState::Accumulating;
            return Err(e);
        }

        self.metrics.increment_records(records as u64);
        self.metrics.increment_batches(1);

        self.batch = Batch::new(self.strategy.encoding());
        self.state = BufferState::Idle;
        Ok(())
    }
}

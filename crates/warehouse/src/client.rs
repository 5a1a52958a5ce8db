use crate::{
    error::{RowError, WarehouseError},
    table::TableRef,
};
use async_trait::async_trait;
use bytes::Bytes;
use model::{column::ColumnDefinition, record::Record};
use std::time::Duration;

/// Options applied to batch load jobs.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Per-call timeout for the submission request.
    pub timeout: Duration,
    /// Permit additive column growth during the load.
    pub allow_field_addition: bool,
    /// Skip values that have no matching destination column.
    pub ignore_unknown_values: bool,
}

impl LoadOptions {
    pub fn new(timeout: Duration) -> Self {
        LoadOptions {
            timeout,
            allow_field_addition: true,
            ignore_unknown_values: true,
        }
    }
}

/// Handle to an asynchronous warehouse load job. Created on submission and
/// owned by the job tracker until awaited.
#[async_trait]
pub trait LoadJob: Send {
    fn id(&self) -> &str;

    /// Waits until the warehouse reports a terminal state for this job.
    async fn wait(self: Box<Self>) -> Result<(), WarehouseError>;
}

/// Narrow interface over the warehouse provider. Implementations are shared
/// across stream sinks and must tolerate concurrent calls.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// No-op when the dataset already exists.
    async fn create_dataset_if_absent(&self, dataset: &str) -> Result<(), WarehouseError>;

    /// Creates the table with `columns` when absent; returns the live
    /// column set either way.
    async fn create_or_get_table(
        &self,
        table: &TableRef,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<ColumnDefinition>, WarehouseError>;

    /// Persists an additively grown column set in one update call.
    async fn update_table_schema(
        &self,
        table: &TableRef,
        columns: &[ColumnDefinition],
    ) -> Result<(), WarehouseError>;

    /// Synchronous row insert against the live table. Returns one descriptor
    /// per rejected row; an empty list means every row was committed.
    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[Record],
        timeout: Duration,
    ) -> Result<Vec<RowError>, WarehouseError>;

    /// Submits a load job reading newline-delimited records from `data`.
    async fn load_from_buffer(
        &self,
        table: &TableRef,
        data: Bytes,
        options: &LoadOptions,
    ) -> Result<Box<dyn LoadJob>, WarehouseError>;

    /// Submits a load job reading newline-delimited records from a staged
    /// object at `uri`.
    async fn load_from_uri(
        &self,
        table: &TableRef,
        uri: &str,
        options: &LoadOptions,
    ) -> Result<Box<dyn LoadJob>, WarehouseError>;
}

use crate::{
    buffer::{BatchBuffer, BufferState},
    delivery::create_strategy,
    error::SinkError,
    jobs::JobTracker,
    metrics::{Metrics, MetricsSnapshot},
    provision::TableProvisioner,
    schema::{coerce::coerce_record, translate::translate},
};
use chrono::Utc;
use model::{
    column::{ColumnDefinition, ColumnMode, ColumnType, TranslatedSchema},
    record::{BATCHED_AT, EXTRACTED_AT, METADATA_FIELDS, RECEIVED_AT, Record},
    schema::SchemaNode,
};
use serde_json::Value;
use sink_config::settings::ValidatedSettings;
use std::{collections::BTreeMap, sync::Arc};
use tracing::info;
use warehouse::{client::WarehouseClient, storage::ObjectStore, table::TableRef};

/// One stream's destination sink: the translated schema, the batch buffer,
/// the configured delivery strategy, and job tracking wired together.
/// Clients are injected once at construction and shared across sinks.
pub struct WarehouseSink {
    stream_name: String,
    schema: TranslatedSchema,
    buffer: BatchBuffer,
    tracker: Arc<JobTracker>,
    settings: ValidatedSettings,
    metrics: Metrics,
}

impl std::fmt::Debug for WarehouseSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseSink")
            .field("stream_name", &self.stream_name)
            .finish_non_exhaustive()
    }
}

impl WarehouseSink {
    pub fn new(
        stream_name: &str,
        schema_properties: &BTreeMap<String, SchemaNode>,
        settings: ValidatedSettings,
        client: Arc<dyn WarehouseClient>,
        store: Option<Arc<dyn ObjectStore>>,
    ) -> Result<Self, SinkError> {
        let mut schema = translate(schema_properties);
        if settings.add_record_metadata {
            append_metadata_columns(&mut schema.columns);
        }

        let table = TableRef::new(&settings.project, &settings.dataset, stream_name);
        let tracker = Arc::new(JobTracker::new(settings.threads));
        let metrics = Metrics::new();
        let provisioner = Arc::new(TableProvisioner::new(client.clone()));
        let strategy = create_strategy(
            &settings,
            client,
            store,
            tracker.clone(),
            metrics.clone(),
        )?;
        let buffer = BatchBuffer::new(
            table,
            schema.columns.clone(),
            settings.batch_size_limit,
            strategy,
            provisioner,
            metrics.clone(),
        );

        info!(
            stream = %stream_name,
            method = ?settings.method,
            coerced = schema.has_coerced,
            columns = schema.columns.len(),
            "Sink initialized"
        );

        Ok(WarehouseSink {
            stream_name: stream_name.to_string(),
            schema,
            buffer,
            tracker,
            settings,
            metrics,
        })
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn schema(&self) -> &TranslatedSchema {
        &self.schema
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Ingests one record: metadata stamps, coercion replay, buffering, and
    /// a threshold drain when one is due.
    pub async fn process(&mut self, mut record: Record) -> Result<(), SinkError> {
        self.preprocess(&mut record);
        self.buffer.accept(record)?;
        self.buffer.maybe_drain().await?;
        Ok(())
    }

    /// Flushes buffered records and waits for every outstanding load job.
    /// Deferred load-job failures surface here; skipping this at stream end
    /// loses failure visibility.
    pub async fn finalize(&mut self) -> Result<(), SinkError> {
        self.buffer.force_drain().await?;
        self.tracker.drain_all().await
    }

    fn preprocess(&self, record: &mut Record) {
        if self.settings.add_record_metadata {
            let now = Utc::now().to_rfc3339();
            record
                .entry(EXTRACTED_AT)
                .or_insert_with(|| Value::String(now.clone()));
            record
                .entry(RECEIVED_AT)
                .or_insert_with(|| Value::String(now));

            // Stamped on every record from the owning batch's start time.
            let batched_at = match self.buffer.state() {
                BufferState::Accumulating => self.buffer.batch_started_at(),
                _ => Utc::now(),
            };
            record.insert(
                BATCHED_AT.to_string(),
                Value::String(batched_at.to_rfc3339()),
            );
        }

        if self.schema.has_coerced {
            coerce_record(record, &self.schema.columns);
        }
    }
}

fn append_metadata_columns(columns: &mut Vec<ColumnDefinition>) {
    for field in METADATA_FIELDS {
        if columns.iter().any(|c| c.name == field) {
            continue;
        }
        columns.push(ColumnDefinition::new(
            field,
            field,
            ColumnType::Timestamp,
            ColumnMode::Nullable,
        ));
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use model::{
    column::{ColumnDefinition, ColumnMode, ColumnType},
    record::Record,
    schema::{SchemaNode, parse_properties},
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::Notify;
use warehouse::{
    client::{LoadJob, LoadOptions, WarehouseClient},
    error::{RowError, WarehouseError},
    storage::ObjectStore,
    table::TableRef,
};

/// Shared, inspectable state behind the fake warehouse client.
#[derive(Debug, Default)]
pub struct WarehouseState {
    pub datasets: HashSet<String>,
    /// Live table schemas keyed by qualified table name.
    pub tables: HashMap<String, Vec<ColumnDefinition>>,
    pub schema_updates: usize,

    pub inserted: Vec<Record>,
    pub insert_calls: usize,
    /// Row errors returned by the next insert call, then cleared.
    pub insert_errors: Vec<RowError>,

    /// Successful load submissions, in order.
    pub buffer_loads: Vec<Bytes>,
    pub uri_loads: Vec<String>,
    pub load_attempts: usize,
    /// Submissions to fail with a transient error before succeeding.
    pub submit_failures_remaining: usize,

    pub jobs_completed: usize,
    /// Make every created job report failure on `wait`.
    pub fail_jobs: bool,
    /// When set, jobs wait on this gate before completing.
    pub job_gate: Option<Arc<Notify>>,

    pub fail_dataset: bool,
}

pub struct FakeWarehouse {
    state: Arc<Mutex<WarehouseState>>,
    job_counter: Mutex<usize>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        FakeWarehouse {
            state: Arc::new(Mutex::new(WarehouseState::default())),
            job_counter: Mutex::new(0),
        }
    }

    pub fn handle(&self) -> Arc<Mutex<WarehouseState>> {
        self.state.clone()
    }

    fn make_job(&self) -> Box<dyn LoadJob> {
        let mut counter = self.job_counter.lock().expect("job counter");
        *counter += 1;
        let (fail, gate) = {
            let state = self.state.lock().expect("warehouse state");
            (state.fail_jobs, state.job_gate.clone())
        };
        Box::new(FakeLoadJob {
            id: format!("job-{}", *counter),
            fail,
            gate,
            state: self.state.clone(),
        })
    }

    fn check_submission(&self, table: &TableRef) -> Result<(), WarehouseError> {
        let mut state = self.state.lock().expect("warehouse state");
        state.load_attempts += 1;
        if state.submit_failures_remaining > 0 {
            state.submit_failures_remaining -= 1;
            return Err(WarehouseError::LoadSubmit {
                table: table.qualified(),
                source: Box::new(std::io::Error::other("transient submission failure")),
            });
        }
        Ok(())
    }
}

impl Default for FakeWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarehouseClient for FakeWarehouse {
    async fn create_dataset_if_absent(&self, dataset: &str) -> Result<(), WarehouseError> {
        let mut state = self.state.lock().expect("warehouse state");
        if state.fail_dataset {
            return Err(WarehouseError::Dataset {
                dataset: dataset.to_string(),
                source: Box::new(std::io::Error::other("permission denied")),
            });
        }
        state.datasets.insert(dataset.to_string());
        Ok(())
    }

    async fn create_or_get_table(
        &self,
        table: &TableRef,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<ColumnDefinition>, WarehouseError> {
        let mut state = self.state.lock().expect("warehouse state");
        Ok(state
            .tables
            .entry(table.qualified())
            .or_insert_with(|| columns.to_vec())
            .clone())
    }

    async fn update_table_schema(
        &self,
        table: &TableRef,
        columns: &[ColumnDefinition],
    ) -> Result<(), WarehouseError> {
        let mut state = self.state.lock().expect("warehouse state");
        state.tables.insert(table.qualified(), columns.to_vec());
        state.schema_updates += 1;
        Ok(())
    }

    async fn insert_rows(
        &self,
        _table: &TableRef,
        rows: &[Record],
        _timeout: Duration,
    ) -> Result<Vec<RowError>, WarehouseError> {
        let mut state = self.state.lock().expect("warehouse state");
        state.insert_calls += 1;
        state.inserted.extend(rows.iter().cloned());
        Ok(std::mem::take(&mut state.insert_errors))
    }

    async fn load_from_buffer(
        &self,
        table: &TableRef,
        data: Bytes,
        _options: &LoadOptions,
    ) -> Result<Box<dyn LoadJob>, WarehouseError> {
        self.check_submission(table)?;
        self.state
            .lock()
            .expect("warehouse state")
            .buffer_loads
            .push(data);
        Ok(self.make_job())
    }

    async fn load_from_uri(
        &self,
        table: &TableRef,
        uri: &str,
        _options: &LoadOptions,
    ) -> Result<Box<dyn LoadJob>, WarehouseError> {
        self.check_submission(table)?;
        self.state
            .lock()
            .expect("warehouse state")
            .uri_loads
            .push(uri.to_string());
        Ok(self.make_job())
    }
}

pub struct FakeLoadJob {
    id: String,
    fail: bool,
    gate: Option<Arc<Notify>>,
    state: Arc<Mutex<WarehouseState>>,
}

#[async_trait]
impl LoadJob for FakeLoadJob {
    fn id(&self) -> &str {
        &self.id
    }

    async fn wait(self: Box<Self>) -> Result<(), WarehouseError> {
        if let Some(gate) = self.gate.clone() {
            gate.notified().await;
        }
        self.state.lock().expect("warehouse state").jobs_completed += 1;
        if self.fail {
            Err(WarehouseError::LoadJob {
                job_id: self.id,
                reason: "simulated load failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Object store keeping uploads in memory, keyed by relative path.
pub struct FakeObjectStore {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl FakeObjectStore {
    pub fn new(bucket: &str) -> Self {
        FakeObjectStore {
            bucket: bucket.to_string(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn objects(&self) -> Arc<Mutex<HashMap<String, Bytes>>> {
        self.objects.clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn upload(&self, path: &str, data: Bytes) -> Result<String, WarehouseError> {
        self.objects
            .lock()
            .expect("object store state")
            .insert(path.to_string(), data);
        Ok(format!("mem://{}/{}", self.bucket, path))
    }
}

/// A flat orders-like schema used across scenarios.
pub fn orders_schema() -> BTreeMap<String, SchemaNode> {
    parse_properties(serde_json::json!({
        "id": {"type": "integer"},
        "total": {"type": "number"},
        "placed_at": {"type": "string", "format": "date-time"},
    }))
    .expect("parse orders schema")
}

/// A schema whose `payload` property forces coercion.
pub fn coerced_schema() -> BTreeMap<String, SchemaNode> {
    parse_properties(serde_json::json!({
        "id": {"type": "integer"},
        "payload": {"type": "object"},
    }))
    .expect("parse coerced schema")
}

pub fn order_record(id: i64) -> Record {
    let serde_json::Value::Object(record) = serde_json::json!({
        "id": id,
        "total": 9.99,
        "placed_at": "2024-05-01T00:00:00Z",
    }) else {
        panic!("record must be an object");
    };
    record
}

pub fn column(name: &str, column_type: ColumnType) -> ColumnDefinition {
    ColumnDefinition::new(name, name, column_type, ColumnMode::Nullable)
}

/// Number of newline-delimited records in a load payload.
pub fn ndjson_lines(data: &Bytes) -> usize {
    data.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count()
}

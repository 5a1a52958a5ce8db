use crate::record::Record;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Buffer encoding chosen by the active delivery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEncoding {
    /// In-memory sequence of record mappings (streaming inserts).
    Rows,
    /// Newline-delimited serialized records (load jobs).
    Ndjson,
}

#[derive(Debug)]
pub enum BatchPayload {
    Rows(Vec<Record>),
    Ndjson(BytesMut),
}

impl BatchPayload {
    pub fn empty(encoding: BatchEncoding) -> Self {
        match encoding {
            BatchEncoding::Rows => BatchPayload::Rows(Vec::new()),
            BatchEncoding::Ndjson => BatchPayload::Ndjson(BytesMut::new()),
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            BatchPayload::Rows(rows) => rows.len() * std::mem::size_of::<Record>(),
            BatchPayload::Ndjson(buf) => buf.len(),
        }
    }
}

/// A bounded group of records accumulated between drains. Owned exclusively
/// by one stream's buffer; never shared.
#[derive(Debug)]
pub struct Batch {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub payload: BatchPayload,
    pub record_count: usize,
}

impl Batch {
    pub fn new(encoding: BatchEncoding) -> Self {
        Batch {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            payload: BatchPayload::empty(encoding),
            record_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

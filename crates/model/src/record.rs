use serde_json::{Map, Value};

/// A single ingested record, already validated upstream against the
/// stream's declared schema.
pub type Record = Map<String, Value>;

/// Metadata columns injected when `add_record_metadata` is enabled.
pub const EXTRACTED_AT: &str = "_sdc_extracted_at";
pub const RECEIVED_AT: &str = "_sdc_received_at";
pub const BATCHED_AT: &str = "_sdc_batched_at";

pub const METADATA_FIELDS: [&str; 3] = [EXTRACTED_AT, RECEIVED_AT, BATCHED_AT];

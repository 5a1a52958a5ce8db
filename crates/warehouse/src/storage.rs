use crate::error::WarehouseError;
use async_trait::async_trait;
use bytes::Bytes;

/// Intermediate object storage used by the staged load strategy. The store
/// is constructed for one bucket; `path` is relative to it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `data` at `path` and returns the full object URI a load job
    /// can reference.
    async fn upload(&self, path: &str, data: Bytes) -> Result<String, WarehouseError>;
}

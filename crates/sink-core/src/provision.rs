use crate::error::SinkError;
use model::column::ColumnDefinition;
use std::sync::Arc;
use tracing::info;
use warehouse::{client::WarehouseClient, table::TableRef};

/// Idempotently ensures the destination exists and additively evolves its
/// schema. Live columns are never removed, reordered, or retyped; providers
/// typically reject such changes, so the schema only grows.
pub struct TableProvisioner {
    client: Arc<dyn WarehouseClient>,
}

impl TableProvisioner {
    pub fn new(client: Arc<dyn WarehouseClient>) -> Self {
        TableProvisioner { client }
    }

    /// Creates the dataset and table when absent, then appends any desired
    /// column missing from the live schema in one update call. Calling twice
    /// with the same desired columns is a no-op on the second call.
    pub async fn ensure(
        &self,
        table: &TableRef,
        desired: &[ColumnDefinition],
    ) -> Result<(), SinkError> {
        self.client
            .create_dataset_if_absent(&table.dataset)
            .await
            .map_err(|e| SinkError::Provision {
                table: table.qualified(),
                source: e,
            })?;

        let live = self
            .client
            .create_or_get_table(table, desired)
            .await
            .map_err(|e| SinkError::Provision {
                table: table.qualified(),
                source: e,
            })?;

        let missing: Vec<ColumnDefinition> = desired
            .iter()
            .filter(|column| !live.iter().any(|l| l.name == column.name))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        info!(
            table = %table,
            added = missing.len(),
            "Adding missing columns to live table schema"
        );

        let mut updated = live;
        updated.extend(missing);

        self.client
            .update_table_schema(table, &updated)
            .await
            .map_err(|e| SinkError::Provision {
                table: table.qualified(),
                source: e,
            })
    }
}

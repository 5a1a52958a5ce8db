use std::fmt;
use uuid::Uuid;

/// Fully qualified destination table: `{project}.{dataset}.{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub name: String,
}

impl TableRef {
    pub fn new(project: &str, dataset: &str, stream_name: &str) -> Self {
        TableRef {
            project: project.to_string(),
            dataset: dataset.to_string(),
            name: stream_name.to_string(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}.{}", self.project, self.dataset, self.name)
    }

    /// Deterministic object path for a staged batch, relative to the
    /// configured bucket: `{prefix}/{dataset}/{stream}/{batch_id}.jsonl`.
    pub fn staged_object_path(&self, prefix: &str, batch_id: &Uuid) -> String {
        format!("{}/{}/{}/{}.jsonl", prefix, self.dataset, self.name, batch_id)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_joins_parts() {
        let table = TableRef::new("acme", "raw", "orders");
        assert_eq!(table.qualified(), "acme.raw.orders");
        assert_eq!(table.to_string(), "acme.raw.orders");
    }

    #[test]
    fn staged_path_is_deterministic() {
        let table = TableRef::new("acme", "raw", "orders");
        let batch_id = Uuid::nil();
        assert_eq!(
            table.staged_object_path("warehouse-sink", &batch_id),
            format!("warehouse-sink/raw/orders/{batch_id}.jsonl")
        );
    }
}

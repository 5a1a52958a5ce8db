use serde::Serialize;

/// Primitive warehouse column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Numeric,
    Boolean,
    Date,
    Time,
    Timestamp,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    Nullable,
    Repeated,
}

/// How a column came to be during schema translation. Coerced variants mark
/// subtrees the declared schema could not describe, degraded to an opaque
/// JSON string column. The record coercer walks these same tags at write
/// time, so translation and coercion cannot diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Directly mapped from the declared type.
    Mapped,
    /// Object with no declared `properties`.
    CoercedObject,
    /// Array with no declared `items`.
    CoercedArray,
}

impl ColumnSource {
    pub fn is_coerced(&self) -> bool {
        !matches!(self, ColumnSource::Mapped)
    }
}

/// One column of the destination table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Sanitized warehouse identifier, `[a-z0-9_]+`, unique within its parent.
    pub name: String,
    /// Property name as declared in the stream schema, used to walk records.
    pub source_field: String,
    pub column_type: ColumnType,
    pub mode: ColumnMode,
    /// Nested columns for record-typed columns.
    pub fields: Vec<ColumnDefinition>,
    pub source: ColumnSource,
}

impl ColumnDefinition {
    pub fn new(
        name: impl Into<String>,
        source_field: impl Into<String>,
        column_type: ColumnType,
        mode: ColumnMode,
    ) -> Self {
        ColumnDefinition {
            name: name.into(),
            source_field: source_field.into(),
            column_type,
            mode,
            fields: Vec::new(),
            source: ColumnSource::Mapped,
        }
    }

    /// A subtree degraded to a nullable-or-repeated string column.
    pub fn coerced(
        name: impl Into<String>,
        source_field: impl Into<String>,
        mode: ColumnMode,
        source: ColumnSource,
    ) -> Self {
        ColumnDefinition {
            name: name.into(),
            source_field: source_field.into(),
            column_type: ColumnType::String,
            mode,
            fields: Vec::new(),
            source,
        }
    }

    pub fn with_fields(mut self, fields: Vec<ColumnDefinition>) -> Self {
        self.fields = fields;
        self
    }

    /// True when this column or any nested column was coerced.
    pub fn is_coerced(&self) -> bool {
        self.source.is_coerced() || self.fields.iter().any(|f| f.is_coerced())
    }
}

/// The result of translating a stream schema: the column tree plus whether
/// any subtree had to be coerced. `has_coerced` is computed once and is
/// final for the sink's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedSchema {
    pub columns: Vec<ColumnDefinition>,
    pub has_coerced: bool,
}

impl TranslatedSchema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        let has_coerced = columns.iter().any(|c| c.is_coerced());
        TranslatedSchema {
            columns,
            has_coerced,
        }
    }

    pub fn find(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }
}

use model::{
    column::{ColumnDefinition, ColumnMode, ColumnSource, ColumnType, TranslatedSchema},
    schema::{SchemaNode, TypeSet},
};
use std::collections::BTreeMap;

/// Maps a declared primitive type set plus format to a warehouse column
/// type. First match wins; an ambiguous integer/string union stays a string,
/// the safest lossless representation.
pub fn map_type(types: &TypeSet, format: Option<&str>) -> ColumnType {
    match format {
        Some("date-time") => return ColumnType::Timestamp,
        Some("date") => return ColumnType::Date,
        Some("time") => return ColumnType::Time,
        _ => {}
    }

    if types.contains("number") {
        ColumnType::Numeric
    } else if types.contains("integer") && types.contains("string") {
        ColumnType::String
    } else if types.contains("integer") {
        ColumnType::Integer
    } else if types.contains("boolean") {
        ColumnType::Boolean
    } else if types.contains("object") {
        ColumnType::Record
    } else {
        ColumnType::String
    }
}

/// Returns a safe warehouse column identifier: backticks stripped, anything
/// outside `[A-Za-z0-9_]` replaced with `_`, then case-folded.
pub fn safe_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '`')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Translates a stream's declared properties into a warehouse column tree.
/// Never fails: subtrees the schema cannot describe are degraded to string
/// columns and tagged, trading strictness for availability.
pub fn translate(properties: &BTreeMap<String, SchemaNode>) -> TranslatedSchema {
    let columns = properties
        .iter()
        .map(|(name, node)| translate_property(name, node))
        .collect();
    TranslatedSchema::new(columns)
}

fn translate_property(name: &str, node: &SchemaNode) -> ColumnDefinition {
    let safe_name = safe_column_name(name);

    if node.types.contains("array") {
        match &node.items {
            // No `items` declared: the element shape is unknowable.
            None => {
                ColumnDefinition::coerced(safe_name, name, ColumnMode::Nullable, ColumnSource::CoercedArray)
            }
            Some(items) => {
                // Item unions take the same first-match-wins precedence as
                // top-level unions.
                let item_type = map_type(&items.types, items.format.as_deref());
                if item_type == ColumnType::Record {
                    translate_record(safe_name, name, items, ColumnMode::Repeated)
                } else {
                    ColumnDefinition::new(safe_name, name, item_type, ColumnMode::Repeated)
                }
            }
        }
    } else if node.types.contains("object") {
        translate_record(safe_name, name, node, ColumnMode::Nullable)
    } else {
        ColumnDefinition::new(
            safe_name,
            name,
            map_type(&node.types, node.format.as_deref()),
            ColumnMode::Nullable,
        )
    }
}

fn translate_record(
    safe_name: String,
    source_field: &str,
    node: &SchemaNode,
    mode: ColumnMode,
) -> ColumnDefinition {
    let fields: Vec<ColumnDefinition> = node
        .properties
        .iter()
        .map(|(name, prop)| translate_property(name, prop))
        .collect();

    if fields.is_empty() {
        // No declared properties: degrade to an opaque string column.
        ColumnDefinition::coerced(safe_name, source_field, mode, ColumnSource::CoercedObject)
    } else {
        ColumnDefinition::new(safe_name, source_field, ColumnType::Record, mode).with_fields(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::schema::parse_properties;
    use serde_json::json;

    fn props(value: serde_json::Value) -> BTreeMap<String, SchemaNode> {
        parse_properties(value).expect("parse schema properties")
    }

    #[test]
    fn format_takes_precedence_over_type() {
        assert_eq!(
            map_type(&TypeSet::single("string"), Some("date-time")),
            ColumnType::Timestamp
        );
        assert_eq!(map_type(&TypeSet::single("string"), Some("date")), ColumnType::Date);
        assert_eq!(map_type(&TypeSet::single("string"), Some("time")), ColumnType::Time);
    }

    #[test]
    fn union_of_integer_and_string_stays_string() {
        assert_eq!(
            map_type(&TypeSet::union(&["integer", "string"]), None),
            ColumnType::String
        );
    }

    #[test]
    fn primitive_precedence() {
        assert_eq!(map_type(&TypeSet::union(&["number", "integer"]), None), ColumnType::Numeric);
        assert_eq!(map_type(&TypeSet::single("integer"), None), ColumnType::Integer);
        assert_eq!(map_type(&TypeSet::single("boolean"), None), ColumnType::Boolean);
        assert_eq!(map_type(&TypeSet::single("object"), None), ColumnType::Record);
        assert_eq!(map_type(&TypeSet::single("null"), None), ColumnType::String);
    }

    #[test]
    fn names_are_sanitized_and_folded() {
        assert_eq!(safe_column_name("`Order-ID`"), "order_id");
        assert_eq!(safe_column_name("total amount"), "total_amount");
        assert_eq!(safe_column_name("already_safe9"), "already_safe9");
    }

    #[test]
    fn scalar_properties_become_nullable_columns() {
        let schema = translate(&props(json!({
            "id": {"type": "integer"},
            "created_at": {"type": "string", "format": "date-time"},
        })));

        assert!(!schema.has_coerced);
        let id = schema.find("id").expect("id column");
        assert_eq!(id.column_type, ColumnType::Integer);
        assert_eq!(id.mode, ColumnMode::Nullable);
        let created = schema.find("created_at").expect("created_at column");
        assert_eq!(created.column_type, ColumnType::Timestamp);
    }

    #[test]
    fn nested_objects_recurse_into_record_columns() {
        let schema = translate(&props(json!({
            "address": {
                "type": "object",
                "properties": {
                    "city": {"type": "string"},
                    "geo": {
                        "type": "object",
                        "properties": {"lat": {"type": "number"}},
                    },
                },
            },
        })));

        assert!(!schema.has_coerced);
        let address = schema.find("address").expect("address column");
        assert_eq!(address.column_type, ColumnType::Record);
        assert_eq!(address.fields.len(), 2);
        let geo = address
            .fields
            .iter()
            .find(|c| c.name == "geo")
            .expect("geo column");
        assert_eq!(geo.fields[0].column_type, ColumnType::Numeric);
    }

    #[test]
    fn object_without_properties_is_coerced() {
        let schema = translate(&props(json!({
            "payload": {"type": "object"},
        })));

        assert!(schema.has_coerced);
        let payload = schema.find("payload").expect("payload column");
        assert_eq!(payload.column_type, ColumnType::String);
        assert_eq!(payload.mode, ColumnMode::Nullable);
        assert_eq!(payload.source, ColumnSource::CoercedObject);
    }

    #[test]
    fn array_without_items_is_coerced() {
        let schema = translate(&props(json!({
            "tags": {"type": "array"},
        })));

        assert!(schema.has_coerced);
        let tags = schema.find("tags").expect("tags column");
        assert_eq!(tags.column_type, ColumnType::String);
        assert_eq!(tags.mode, ColumnMode::Nullable);
        assert_eq!(tags.source, ColumnSource::CoercedArray);
    }

    #[test]
    fn array_of_records_becomes_repeated_record() {
        let schema = translate(&props(json!({
            "line_items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {"sku": {"type": "string"}, "qty": {"type": "integer"}},
                },
            },
        })));

        assert!(!schema.has_coerced);
        let items = schema.find("line_items").expect("line_items column");
        assert_eq!(items.column_type, ColumnType::Record);
        assert_eq!(items.mode, ColumnMode::Repeated);
        assert_eq!(items.fields.len(), 2);
    }

    #[test]
    fn array_of_scalars_becomes_repeated_scalar() {
        let schema = translate(&props(json!({
            "scores": {"type": "array", "items": {"type": "number"}},
        })));

        let scores = schema.find("scores").expect("scores column");
        assert_eq!(scores.column_type, ColumnType::Numeric);
        assert_eq!(scores.mode, ColumnMode::Repeated);
    }

    #[test]
    fn array_of_objects_without_properties_is_coerced_repeated() {
        let schema = translate(&props(json!({
            "events": {"type": "array", "items": {"type": "object"}},
        })));

        assert!(schema.has_coerced);
        let events = schema.find("events").expect("events column");
        assert_eq!(events.column_type, ColumnType::String);
        assert_eq!(events.mode, ColumnMode::Repeated);
        assert_eq!(events.source, ColumnSource::CoercedObject);
    }

    #[test]
    fn translation_is_deterministic() {
        let properties = props(json!({
            "b": {"type": "object"},
            "a": {"type": "array"},
            "c": {"type": ["integer", "string"]},
        }));

        assert_eq!(translate(&properties), translate(&properties));
    }

    #[test]
    fn malformed_substructure_never_panics() {
        let schema = translate(&props(json!({
            "weird": {"type": [], "items": {"properties": {}}},
            "empty": {},
        })));

        assert_eq!(schema.columns.len(), 2);
        for column in &schema.columns {
            assert_eq!(column.column_type, ColumnType::String);
        }
    }
}

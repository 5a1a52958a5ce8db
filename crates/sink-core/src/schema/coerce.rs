use model::{
    column::{ColumnDefinition, ColumnMode, ColumnSource},
    record::Record,
};
use serde_json::Value;

/// Rewrites a record so its shape matches the translated, possibly degraded,
/// schema. Fields whose column was coerced to a string are serialized in
/// place as compact JSON; fields with no matching column pass through
/// untouched. Walking the same column tree the translator produced replays
/// its coercion decisions exactly.
pub fn coerce_record(record: &mut Record, columns: &[ColumnDefinition]) {
    for column in columns {
        // The walk is an optimization: skip subtrees with nothing to coerce.
        if !column.is_coerced() {
            continue;
        }
        if let Some(value) = record.get_mut(&column.source_field) {
            apply(value, column);
        }
    }
}

fn apply(value: &mut Value, column: &ColumnDefinition) {
    match column.source {
        ColumnSource::CoercedObject => match column.mode {
            ColumnMode::Nullable => {
                if value.is_object() {
                    stringify(value);
                }
            }
            // Array whose items were an object with no declared properties:
            // each element becomes its own JSON string.
            ColumnMode::Repeated => {
                if let Value::Array(items) = value {
                    for item in items {
                        stringify(item);
                    }
                }
            }
        },
        ColumnSource::CoercedArray => {
            if value.is_array() {
                stringify(value);
            }
        }
        ColumnSource::Mapped => match value {
            Value::Object(map) => coerce_record(map, &column.fields),
            Value::Array(items) if !column.fields.is_empty() => {
                for item in items {
                    if let Value::Object(map) = item {
                        coerce_record(map, &column.fields);
                    }
                }
            }
            _ => {}
        },
    }
}

fn stringify(value: &mut Value) {
    if let Ok(text) = serde_json::to_string(value) {
        *value = Value::String(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::translate::translate;
    use model::schema::parse_properties;
    use serde_json::json;

    fn coerced(schema: serde_json::Value, record: serde_json::Value) -> Record {
        let properties = parse_properties(schema).expect("parse schema properties");
        let translated = translate(&properties);
        assert!(translated.has_coerced, "expected a coerced schema");

        let Value::Object(mut record) = record else {
            panic!("record must be an object");
        };
        coerce_record(&mut record, &translated.columns);
        record
    }

    #[test]
    fn object_without_properties_round_trips_as_json_text() {
        let record = coerced(
            json!({"payload": {"type": "object"}}),
            json!({"payload": {"a": 1}}),
        );

        assert_eq!(record["payload"], json!("{\"a\":1}"));
    }

    #[test]
    fn array_without_items_is_serialized_whole() {
        let record = coerced(
            json!({"tags": {"type": "array"}}),
            json!({"tags": [1, "x", {"k": true}]}),
        );

        assert_eq!(record["tags"], json!("[1,\"x\",{\"k\":true}]"));
    }

    #[test]
    fn declared_subschemas_recurse_without_transformation() {
        let record = coerced(
            json!({
                "outer": {
                    "type": "object",
                    "properties": {
                        "known": {"type": "string"},
                        "blob": {"type": "object"},
                    },
                },
            }),
            json!({"outer": {"known": "ok", "blob": {"x": [1, 2]}}}),
        );

        assert_eq!(record["outer"]["known"], json!("ok"));
        assert_eq!(record["outer"]["blob"], json!("{\"x\":[1,2]}"));
    }

    #[test]
    fn repeated_records_coerce_each_element() {
        let record = coerced(
            json!({
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"meta": {"type": "object"}},
                    },
                },
            }),
            json!({"items": [{"meta": {"a": 1}}, {"meta": {"b": 2}}]}),
        );

        assert_eq!(record["items"][0]["meta"], json!("{\"a\":1}"));
        assert_eq!(record["items"][1]["meta"], json!("{\"b\":2}"));
    }

    #[test]
    fn array_of_undescribed_objects_serializes_each_element() {
        let record = coerced(
            json!({"events": {"type": "array", "items": {"type": "object"}}}),
            json!({"events": [{"a": 1}, {"b": 2}]}),
        );

        assert_eq!(record["events"], json!(["{\"a\":1}", "{\"b\":2}"]));
    }

    #[test]
    fn fields_absent_from_schema_pass_through() {
        let record = coerced(
            json!({"payload": {"type": "object"}}),
            json!({"payload": {}, "extra": {"untouched": true}}),
        );

        assert_eq!(record["extra"], json!({"untouched": true}));
    }

    #[test]
    fn shape_mismatches_are_left_alone() {
        // A scalar where the schema expected an undescribed object.
        let record = coerced(
            json!({"payload": {"type": "object"}}),
            json!({"payload": 42}),
        );

        assert_eq!(record["payload"], json!(42));
    }
}

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The set of primitive type names declared for a schema property.
/// A JSON-schema `type` may be a single name or a union list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSet(Vec<String>);

impl TypeSet {
    pub fn single(ty: &str) -> Self {
        TypeSet(vec![ty.to_string()])
    }

    pub fn union(types: &[&str]) -> Self {
        TypeSet(types.iter().map(|t| t.to_string()).collect())
    }

    pub fn contains(&self, ty: &str) -> bool {
        self.0.iter().any(|t| t == ty)
    }
}

impl Default for TypeSet {
    /// An undeclared `type` is treated as `string`.
    fn default() -> Self {
        TypeSet::single("string")
    }
}

impl<'de> Deserialize<'de> for TypeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(ty) => TypeSet(vec![ty]),
            OneOrMany::Many(types) => TypeSet(types),
        })
    }
}

/// One property of the stream's declared schema. Immutable once parsed;
/// schemas are tree-shaped by construction, so no cycles are possible.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default)]
    pub types: TypeSet,

    #[serde(default)]
    pub format: Option<String>,

    /// Nested properties for object-typed nodes. Empty when undeclared.
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaNode>,

    /// Item schema for array-typed nodes. Absent when undeclared.
    #[serde(default)]
    pub items: Option<Box<SchemaNode>>,
}

/// Parses the `properties` map of a stream's declared schema.
pub fn parse_properties(
    value: serde_json::Value,
) -> Result<BTreeMap<String, SchemaNode>, serde_json::Error> {
    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_accepts_single_name_and_union() {
        let props = parse_properties(json!({
            "id": {"type": "integer"},
            "ref": {"type": ["integer", "string"]},
        }))
        .expect("parse properties");

        assert!(props["id"].types.contains("integer"));
        assert!(props["ref"].types.contains("integer"));
        assert!(props["ref"].types.contains("string"));
    }

    #[test]
    fn missing_type_defaults_to_string() {
        let props = parse_properties(json!({"note": {}})).expect("parse properties");
        assert!(props["note"].types.contains("string"));
    }

    #[test]
    fn nested_properties_and_items_round_trip() {
        let props = parse_properties(json!({
            "address": {
                "type": "object",
                "properties": {"city": {"type": "string"}},
            },
            "tags": {"type": "array", "items": {"type": "string"}},
        }))
        .expect("parse properties");

        assert!(props["address"].properties.contains_key("city"));
        let items = props["tags"].items.as_ref().expect("items schema");
        assert!(items.types.contains("string"));
    }
}

//! Built-in schema fixtures
//!
//! `SimpleType` covers every leaf kind with and without defaults and
//! optionality; `NestedType` adds nested arrays and sub objects. The
//! `Base`/`Sub`/`Sub2` trio is a chain of `file://` references.

use crate::document::Document;
use crate::error::Result;
use crate::loader::MemoryLoader;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// File name `write_test_schema` writes to
pub const TEST_SCHEMA_FILE: &str = "simple_type.schema.json";

fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => Document::from(map),
        _ => Document::new(),
    }
}

/// Inline `Sub` object used by `SimpleType` and `NestedType`
pub fn sub() -> Document {
    document(json!({
        "$id": "https://Sub",
        "title": "Sub",
        "description": "Description",
        "properties": {
            "Test": { "type": "string" },
            "opt-Test": { "type": "string" }
        },
        "required": ["Test"],
        "type": "object"
    }))
}

fn simple_type_value() -> Value {
    json!({
        "$id": "https://SimpleType",
        "title": "SimpleType",
        "type": "object",
        "description": "Jojo SimpleType",
        "properties": {
            "string": { "type": "string" },
            "default-string": { "type": "string", "default": "hallo" },
            "optional-string": { "type": "string" },
            "optional-default-string": { "type": "string", "default": "hallo" },
            "createdAt": { "type": "string", "format": "date-time" },
            "default-createdAt": {
                "type": "string",
                "default": "2023-12-31T23:59:59Z",
                "format": "date-time"
            },
            "optional-createdAt": { "type": "string", "format": "date-time" },
            "optional-default-createdAt": {
                "type": "string",
                "format": "date-time",
                "default": "2023-12-31T23:59:59Z"
            },
            "float64": { "type": "number" },
            "default-float64": { "type": "number", "format": "float32", "default": 4711.4 },
            "optional-float32": { "type": "number", "format": "float32" },
            "optional-default-float32": { "type": "number", "default": 49.2, "format": "float32" },
            "int64": { "type": "integer", "format": "int64" },
            "default-int64": { "type": "integer", "default": 64, "format": "int64" },
            "optional-int32": { "type": "integer", "format": "int32" },
            "optional-default-int32": { "type": "integer", "default": 32, "format": "int32" },
            "bool": { "type": "boolean" },
            "default-bool": { "type": "boolean", "default": true },
            "optional-bool": { "type": "boolean" },
            "optional-default-bool": { "type": "boolean", "default": true },
            "sub": Value::from(sub()),
            "opt-sub": Value::from(sub())
        },
        "required": [
            "string",
            "createdAt",
            "default-string",
            "default-createdAt",
            "float64",
            "default-float64",
            "int64",
            "default-int64",
            "uint64",
            "default-uint64",
            "default-bool",
            "bool",
            "sub"
        ]
    })
}

/// Flat schema with one member per leaf kind and optionality
pub fn simple_type() -> Document {
    document(simple_type_value())
}

fn nest(items: Value, depth: usize) -> Value {
    (0..depth).fold(items, |inner, _| json!({ "type": "array", "items": inner }))
}

/// Nested arrays and sub objects; `required` also lists the `SimpleType` names
pub fn nested_type() -> Document {
    let flat = simple_type_value();
    let mut properties = serde_json::Map::new();
    let members = [
        ("arrayarrayBool", nest(json!({ "type": "boolean" }), 4)),
        ("opt-arrayarrayBool", nest(json!({ "type": "boolean" }), 4)),
        ("arrayString", nest(json!({ "type": "string" }), 1)),
        ("opt-arrayString", nest(json!({ "type": "string" }), 1)),
        ("arrayNumber", nest(json!({ "type": "number" }), 1)),
        ("opt-arrayNumber", nest(json!({ "type": "number" }), 1)),
        ("arrayInteger", nest(json!({ "type": "integer" }), 1)),
        ("opt-arrayInteger", nest(json!({ "type": "integer" }), 1)),
        ("arrayBool", nest(json!({ "type": "boolean" }), 1)),
        ("opt-arrayBool", nest(json!({ "type": "boolean" }), 1)),
        ("arrayarrayFlatSchema", nest(Value::from(sub()), 4)),
        ("opt-arrayarrayFlatSchema", nest(Value::from(sub()), 4)),
        ("sub-flat", Value::from(sub())),
        ("opt-sub-flat", Value::from(sub())),
        ("arraySubType", nest(Value::from(sub()), 1)),
        ("opt-arraySubType", nest(Value::from(sub()), 1)),
    ];
    for (name, property) in members {
        properties.insert(name.to_string(), property);
    }

    let mut required: Vec<Value> = [
        "arrayarrayBool",
        "sub",
        "arrayString",
        "arrayNumber",
        "arrayInteger",
        "arrayBool",
        "arraySubType",
        "arrayarrayFlatSchema",
    ]
    .into_iter()
    .map(Value::from)
    .collect();
    if let Some(Value::Array(flat_required)) = flat.get("required") {
        required.extend(flat_required.iter().cloned());
    }

    document(json!({
        "$id": "https://NestedType",
        "title": "NestedType",
        "type": "object",
        "description": "Jojo NestedType",
        "properties": properties,
        "required": required
    }))
}

/// `base.schema.json`: refers to `sub.schema.json`
pub fn base() -> Document {
    document(json!({
        "$id": "http://example.com/base.schema.json",
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Base",
        "type": "object",
        "description": "Base description",
        "properties": {
            "foo": { "type": "string" },
            "sub": { "$ref": "file://sub.schema.json" }
        },
        "required": ["foo", "sub"]
    }))
}

/// `sub.schema.json`: refers to `sub2.schema.json`
pub fn base_sub() -> Document {
    document(json!({
        "$id": "http://example.com/sub.schema.json",
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Sub",
        "type": "object",
        "description": "Sub description",
        "properties": {
            "sub": { "type": "string" },
            "sub-down": { "$ref": "file://sub2.schema.json" }
        },
        "required": ["bar", "sub-down"]
    }))
}

pub fn sub2() -> Document {
    document(json!({
        "$id": "http://example.com/sub2.schema.json",
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Sub2",
        "type": "object",
        "description": "Sub2 description",
        "properties": {
            "bar": { "type": "string" }
        },
        "required": ["bar"]
    }))
}

/// In-memory loader rooted at `/abs` holding the `Base`/`Sub`/`Sub2` chain
pub fn ref_chain_loader() -> MemoryLoader {
    MemoryLoader::new("/abs")
        .with_file("/abs/base.schema.json", base().to_json())
        .with_file("/abs/sub.schema.json", base_sub().to_json())
        .with_file("/abs/sub2.schema.json", sub2().to_json())
}

/// Write the `SimpleType` schema into `dir`; returns the written path
pub fn write_test_schema(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(TEST_SCHEMA_FILE);
    std::fs::write(&path, simple_type().to_json_pretty()?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_type_member_order() {
        let doc = simple_type();
        let properties = doc.get_document("properties").unwrap();
        let names: Vec<_> = properties.keys().take(4).cloned().collect();
        assert_eq!(
            names,
            vec![
                "string",
                "default-string",
                "optional-string",
                "optional-default-string"
            ]
        );
        assert_eq!(properties.len(), 22);
    }

    #[test]
    fn test_nested_type_requires_simple_type_names() {
        let doc = nested_type();
        let properties = doc.get_document("properties").unwrap();
        assert_eq!(properties.len(), 16);
        assert_eq!(properties.keys().next().unwrap(), "arrayarrayBool");
        let required = doc.get("required").and_then(Value::as_array).unwrap();
        assert_eq!(required.len(), 8 + 13);
        assert_eq!(required[8], "string");
    }

    #[test]
    fn test_write_test_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_schema(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), TEST_SCHEMA_FILE);
        let text = std::fs::read_to_string(&path).unwrap();
        let doc = Document::parse(&text).unwrap();
        assert_eq!(doc, simple_type());
    }
}

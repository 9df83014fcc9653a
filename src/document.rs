//! Ordered JSON documents
//!
//! A schema file is kept as an insertion-ordered JSON object. Member order
//! drives generation order, so a document must serialize back to the same
//! bytes it was parsed from.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// An insertion-ordered JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    map: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse JSON text whose top level must be an object
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_from(text, Path::new("<memory>"))
    }

    /// Parse JSON text, attributing failures to `path`
    pub fn parse_from(text: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| Error::load(path, e))?;
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(Error::load(
                path,
                format!("expected a JSON object, found {}", kind_of(&other)),
            )),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.map.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(Value::as_str)
    }

    /// Nested object under `key`, copied out as a document
    pub fn get_document(&self, key: &str) -> Option<Document> {
        match self.map.get(key) {
            Some(Value::Object(map)) => Some(Document { map: map.clone() }),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Compact JSON
    pub fn to_json(&self) -> String {
        Value::Object(self.map.clone()).to_string()
    }

    /// JSON indented by two spaces
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.map)?)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self { map }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.map)
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! IR back to document form

use super::{NodeId, Property, RefSite, SchemaGraph};
use crate::document::Document;
use serde_json::{Map, Value};

/// Serialize a node back to the input document shape.
///
/// Keys are written in a fixed order and members declared through `$ref`
/// are written back as refs, so a document produced here survives a
/// parse/build/serialize cycle byte for byte.
pub fn to_document(graph: &SchemaGraph, id: NodeId) -> Document {
    let mut doc = Document::new();
    match graph.property(id) {
        Property::Object(o) => {
            put(&mut doc, "$id", o.id.clone());
            put(&mut doc, "$schema", o.schema.clone());
            put(&mut doc, "title", o.title.clone());
            doc.insert("type", "object");
            put(&mut doc, "description", o.description.clone());
            if o.declares_properties {
                let mut members = Map::new();
                for item in &o.items {
                    members.insert(item.name.clone(), child(graph, item.property, &item.reference));
                }
                doc.insert("properties", Value::Object(members));
            }
            if let Some(required) = &o.required {
                doc.insert(
                    "required",
                    Value::Array(required.iter().cloned().map(Value::String).collect()),
                );
            }
            put(&mut doc, "$ref", o.reference.clone());
        }
        Property::Array(a) => {
            doc.insert("type", "array");
            put(&mut doc, "description", a.description.clone());
            doc.insert("items", child(graph, a.items, &a.items_reference));
            put(&mut doc, "$ref", a.reference.clone());
        }
        Property::String(s) => {
            doc.insert("type", "string");
            put(&mut doc, "description", s.description.clone());
            put(&mut doc, "format", s.format.as_ref().map(|f| f.as_str().to_string()));
            put(&mut doc, "default", s.default.clone());
            put(&mut doc, "$ref", s.reference.clone());
        }
        Property::Integer(i) => {
            doc.insert("type", "integer");
            put(&mut doc, "description", i.description.clone());
            put(&mut doc, "format", i.format.map(|f| f.as_str()));
            put(&mut doc, "default", i.default);
            put(&mut doc, "minimum", i.minimum);
            put(&mut doc, "maximum", i.maximum);
            put(&mut doc, "$ref", i.reference.clone());
        }
        Property::Number(n) => {
            doc.insert("type", "number");
            put(&mut doc, "description", n.description.clone());
            put(&mut doc, "format", n.format.map(|f| f.as_str()));
            put(&mut doc, "default", n.default.clone());
            put(&mut doc, "minimum", n.minimum.clone());
            put(&mut doc, "maximum", n.maximum.clone());
            put(&mut doc, "$ref", n.reference.clone());
        }
        Property::Boolean(b) => {
            doc.insert("type", "boolean");
            put(&mut doc, "description", b.description.clone());
            put(&mut doc, "default", b.default);
            put(&mut doc, "$ref", b.reference.clone());
        }
    }
    doc
}

fn child(graph: &SchemaGraph, id: NodeId, site: &Option<RefSite>) -> Value {
    match site {
        Some(site) => {
            let mut map = Map::new();
            map.insert("$ref".to_string(), Value::String(site.reference.clone()));
            if let Some(description) = &site.description {
                map.insert("description".to_string(), Value::String(description.clone()));
            }
            Value::Object(map)
        }
        None => to_document(graph, id).into(),
    }
}

fn put<V: Into<Value>>(doc: &mut Document, key: &str, value: Option<V>) {
    if let Some(value) = value {
        doc.insert(key, value);
    }
}

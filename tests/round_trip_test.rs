//! Schema documents survive build and serialize cycles
//!
//! The first serialization puts keys in canonical order; from there on the
//! output is a fixed point.

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;
use wueste_gen::fixtures;
use wueste_gen::{to_document, Document, MemoryLoader, PropertyBuilder, Registry, SchemaGraph};

fn serialize(doc: &Document) -> Document {
    let mut registry = Registry::new(fixtures::ref_chain_loader());
    let mut graph = SchemaGraph::new();
    let root = PropertyBuilder::new(&mut registry, &mut graph)
        .from_document(doc, Some(Path::new("/abs/root.schema.json")))
        .unwrap();
    to_document(&graph, root)
}

#[rstest]
#[case("simple_type", fixtures::simple_type())]
#[case("nested_type", fixtures::nested_type())]
#[case("base", fixtures::base())]
#[case("sub2", fixtures::sub2())]
fn test_serialize_reaches_fixed_point(#[case] name: &str, #[case] doc: Document) {
    let first = serialize(&doc);
    let second = serialize(&Document::parse(&first.to_json()).unwrap());
    assert_eq!(first.to_json(), second.to_json(), "{}", name);
}

#[rstest]
#[case(fixtures::simple_type())]
#[case(fixtures::nested_type())]
fn test_member_order_is_kept(#[case] doc: Document) {
    let out = serialize(&doc);
    let before: Vec<String> = doc.get_document("properties").unwrap().keys().cloned().collect();
    let after: Vec<String> = out.get_document("properties").unwrap().keys().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(doc.get("required"), out.get("required"));
}

#[test]
fn test_refs_are_written_back_as_refs() {
    let out = serialize(&fixtures::base());
    let properties = out.get_document("properties").unwrap();
    let sub = properties.get_document("sub").unwrap();
    assert_eq!(sub.get_str("$ref"), Some("file://sub.schema.json"));
    assert_eq!(sub.len(), 1);
}

#[test]
fn test_canonical_document_is_byte_identical() {
    let text = r#"{"$id":"https://Sub","title":"Sub","type":"object","description":"Description","properties":{"Test":{"type":"string"},"opt-Test":{"type":"string"}},"required":["Test"]}"#;
    let mut registry = Registry::new(MemoryLoader::new("/abs"));
    let mut graph = SchemaGraph::new();
    let doc = Document::parse(text).unwrap();
    let root = PropertyBuilder::new(&mut registry, &mut graph)
        .from_document(&doc, None)
        .unwrap();
    assert_eq!(to_document(&graph, root).to_json(), text);
}

#[test]
fn test_defaults_keep_their_values() {
    let out = serialize(&fixtures::simple_type());
    let properties = out.get_document("properties").unwrap();
    let created = properties.get_document("default-createdAt").unwrap();
    assert_eq!(created.get_str("default"), Some("2023-12-31T23:59:59Z"));
    assert_eq!(created.get_str("format"), Some("date-time"));
    let float = properties.get_document("default-float64").unwrap();
    assert_eq!(float.get("default").unwrap().to_string(), "4711.4");
    let int = properties.get_document("optional-default-int32").unwrap();
    assert_eq!(int.get("default").unwrap().as_i64(), Some(32));
}

//! Go backend over the built-in fixtures

use pretty_assertions::assert_eq;
use std::path::Path;
use wueste_gen::fixtures;
use wueste_gen::{
    generate, Document, GeneratedUnit, GoBackend, MemoryLoader, PropertyBuilder, Registry,
    RenderConfig, SchemaGraph,
};

fn config() -> RenderConfig {
    RenderConfig {
        package_name: "entity".to_string(),
        indent: "\t".to_string(),
        ..RenderConfig::default()
    }
}

fn render_document(doc: &Document) -> Vec<GeneratedUnit> {
    let mut registry = Registry::new(MemoryLoader::new("/abs"));
    let mut graph = SchemaGraph::new();
    let root = PropertyBuilder::new(&mut registry, &mut graph)
        .from_document(doc, Some(Path::new("/abs/fixture.schema.json")))
        .unwrap();
    generate(&graph, &mut registry, root, &mut GoBackend, &config()).unwrap()
}

fn unit<'a>(units: &'a [GeneratedUnit], name: &str) -> &'a str {
    units
        .iter()
        .find(|u| u.file_name == name)
        .map(|u| u.contents.as_str())
        .unwrap_or_else(|| panic!("no unit {name}"))
}

#[test]
fn test_simple_type_units() {
    let units = render_document(&fixtures::simple_type());
    let names: Vec<_> = units.iter().map(|u| u.file_name.as_str()).collect();
    assert_eq!(names, vec!["simple_type.go", "sub.go"]);

    let out = unit(&units, "simple_type.go");
    assert!(out.contains("package entity\n"), "{out}");
    assert!(out.contains("type SimpleTypeClass interface {"), "{out}");
    assert!(out.contains("\tString() string\n"), "{out}");
    assert!(out.contains("\tOptionalDefaultInt32() rusty.Optional[int64]\n"), "{out}");
    assert!(out.contains("\tSub() SubClass\n"), "{out}");
    assert!(out.contains("\tOptSub() rusty.Optional[SubClass]\n"), "{out}");
    assert!(out.contains("func NewSimpleTypeBuilder() *SimpleTypeBuilder {"), "{out}");
    assert!(out.contains("func NewSimpleTypeFactory() *SimpleTypeFactory {"), "{out}");
    assert!(out.trim_end().ends_with('}'), "{out}");
}

#[test]
fn test_simple_type_defaults() {
    let units = render_document(&fixtures::simple_type());
    let out = unit(&units, "simple_type.go");
    assert!(
        out.contains("defaultString: wueste.OptionalAttribute[string](),"),
        "{out}"
    );
    assert!(out.contains("\tb.defaultString.Set(\"hallo\")\n"), "{out}");
    assert!(
        out.contains("optionalDefaultBool: wueste.OptionalAttribute[rusty.Optional[bool]](),"),
        "{out}"
    );
    assert!(
        out.contains("\tb.optionalDefaultBool.Set(rusty.Some[bool](true))\n"),
        "{out}"
    );
    assert!(
        out.contains("optionalString: wueste.MustAttribute[rusty.Optional[string]](),"),
        "{out}"
    );
    assert!(out.contains("createdAt: wueste.OptionalAttribute[string](),"), "{out}");
    assert!(!out.contains("DefaultAttribute"), "{out}");
}

#[test]
fn test_nested_type_arrays() {
    let units = render_document(&fixtures::nested_type());
    let names: Vec<_> = units.iter().map(|u| u.file_name.as_str()).collect();
    assert_eq!(names, vec!["nested_type.go", "sub.go"]);

    let out = unit(&units, "nested_type.go");
    assert!(out.contains("\tArrayarrayBool() [][][][]bool\n"), "{out}");
    assert!(out.contains("\tArrayarrayFlatSchema() [][][][]SubClass\n"), "{out}");
    assert!(out.contains("\tArraySubType() []SubClass\n"), "{out}");
    assert!(
        out.contains("ArrayarrayFlatSchema [][][][]SubJson `json:\"arrayarrayFlatSchema\"`"),
        "{out}"
    );
    assert!(out.contains("o4 := NewSubFactory().FromMap(m4)"), "{out}");
}

#[test]
fn test_ref_chain_emits_each_file_once() {
    let mut registry = Registry::new(fixtures::ref_chain_loader());
    let mut graph = SchemaGraph::new();
    let root = PropertyBuilder::new(&mut registry, &mut graph)
        .load_root("file://base.schema.json")
        .unwrap();
    let units = generate(&graph, &mut registry, root, &mut GoBackend, &config()).unwrap();
    let names: Vec<_> = units.iter().map(|u| u.file_name.as_str()).collect();
    assert_eq!(names, vec!["base.go", "sub.go", "sub2.go"]);
    assert!(unit(&units, "sub.go").contains("\tSubDown() Sub2Class\n"));
    assert_eq!(units[0].source, "/abs/base.schema.json");

    let again = generate(&graph, &mut registry, root, &mut GoBackend, &config()).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_provenance_header() {
    let doc = fixtures::sub();
    let mut registry = Registry::new(MemoryLoader::new("/abs"));
    let mut graph = SchemaGraph::new();
    let root = PropertyBuilder::new(&mut registry, &mut graph)
        .from_document(&doc, Some(Path::new("/abs/sub.schema.json")))
        .unwrap();
    let config = RenderConfig {
        provenance: true,
        ..config()
    };
    let units = generate(&graph, &mut registry, root, &mut GoBackend, &config).unwrap();
    let out = &units[0].contents;
    assert!(out.contains("// GENERATED FROM: /abs/sub.schema.json\n"), "{out}");
    assert!(out.contains("// SCHEMA HASH: "), "{out}");
    assert!(out.contains("// DO NOT EDIT\n"), "{out}");
    let package = out.find("package entity").unwrap();
    assert!(out.find("// DO NOT EDIT").unwrap() < package, "{out}");
}

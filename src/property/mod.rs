//! Property IR
//!
//! The typed model of a schema. Nodes live in a [`SchemaGraph`] arena and
//! refer to each other by [`NodeId`]; parent links are plain ids, so shared
//! ref targets and reference cycles never create a second owner.
//!
//! ```text
//! Document ──► PropertyBuilder ──► SchemaGraph ──► Backend
//!                    │                  ▲
//!                    ▼                  │
//!                Registry ──────────────┘ (one root node per file)
//! ```

mod builder;
pub mod coerce;
mod serialize;

pub use builder::PropertyBuilder;
pub use serialize::to_document;

use serde_json::Number;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a node inside a [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag, including the two membership tags used for path tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    ObjectItem,
    ArrayItem,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Integer => "integer",
            PropertyKind::Number => "number",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Array => "array",
            PropertyKind::Object => "object",
            PropertyKind::ObjectItem => "objectitem",
            PropertyKind::ArrayItem => "arrayitem",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StringFormat {
    DateTime,
    Date,
    Time,
    Other(String),
}

impl StringFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "date-time" => StringFormat::DateTime,
            "date" => StringFormat::Date,
            "time" => StringFormat::Time,
            other => StringFormat::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StringFormat::DateTime => "date-time",
            StringFormat::Date => "date",
            StringFormat::Time => "time",
            StringFormat::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerFormat {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
}

impl IntegerFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int" => Some(IntegerFormat::Int),
            "int8" => Some(IntegerFormat::Int8),
            "int16" => Some(IntegerFormat::Int16),
            "int32" => Some(IntegerFormat::Int32),
            "int64" => Some(IntegerFormat::Int64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegerFormat::Int => "int",
            IntegerFormat::Int8 => "int8",
            IntegerFormat::Int16 => "int16",
            IntegerFormat::Int32 => "int32",
            IntegerFormat::Int64 => "int64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    Float32,
    Float64,
}

impl NumberFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "float32" => Some(NumberFormat::Float32),
            "float64" => Some(NumberFormat::Float64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumberFormat::Float32 => "float32",
            NumberFormat::Float64 => "float64",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyString {
    pub description: Option<String>,
    pub reference: Option<String>,
    pub default: Option<String>,
    pub format: Option<StringFormat>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyInteger {
    pub description: Option<String>,
    pub reference: Option<String>,
    pub default: Option<i64>,
    pub format: Option<IntegerFormat>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

/// Numbers keep their JSON spelling so `64` does not come back as `64.0`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyNumber {
    pub description: Option<String>,
    pub reference: Option<String>,
    pub default: Option<Number>,
    pub format: Option<NumberFormat>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBoolean {
    pub description: Option<String>,
    pub reference: Option<String>,
    pub default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyArray {
    pub description: Option<String>,
    pub reference: Option<String>,
    pub items: NodeId,
    /// `$ref` the items were declared with
    pub items_reference: Option<RefSite>,
}

/// A `$ref` as written at the place it was used
#[derive(Debug, Clone, PartialEq)]
pub struct RefSite {
    pub reference: String,
    /// Description written next to the `$ref`
    pub description: Option<String>,
}

impl RefSite {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            description: None,
        }
    }
}

/// One named member of an object
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyItem {
    pub name: String,
    pub idx: usize,
    pub optional: bool,
    pub property: NodeId,
    /// `$ref` the member was declared with
    pub reference: Option<RefSite>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyObject {
    pub id: Option<String>,
    pub schema: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    /// Whether the document carried a `properties` key at all
    pub declares_properties: bool,
    pub items: Vec<PropertyItem>,
    pub required: Option<Vec<String>>,
}

impl PropertyObject {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn required(&self) -> &[String] {
        self.required.as_deref().unwrap_or_default()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required().iter().any(|r| r == name)
    }

    pub fn has_members(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn item(&self, name: &str) -> Option<&PropertyItem> {
        self.items.iter().find(|i| i.name == name)
    }
}

/// The closed set of schema node kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    String(PropertyString),
    Integer(PropertyInteger),
    Number(PropertyNumber),
    Boolean(PropertyBoolean),
    Array(PropertyArray),
    Object(PropertyObject),
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::String(_) => PropertyKind::String,
            Property::Integer(_) => PropertyKind::Integer,
            Property::Number(_) => PropertyKind::Number,
            Property::Boolean(_) => PropertyKind::Boolean,
            Property::Array(_) => PropertyKind::Array,
            Property::Object(_) => PropertyKind::Object,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Property::String(p) => p.description.as_deref(),
            Property::Integer(p) => p.description.as_deref(),
            Property::Number(p) => p.description.as_deref(),
            Property::Boolean(p) => p.description.as_deref(),
            Property::Array(p) => p.description.as_deref(),
            Property::Object(p) => p.description.as_deref(),
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Property::String(p) => p.reference.as_deref(),
            Property::Integer(p) => p.reference.as_deref(),
            Property::Number(p) => p.reference.as_deref(),
            Property::Boolean(p) => p.reference.as_deref(),
            Property::Array(p) => p.reference.as_deref(),
            Property::Object(p) => p.reference.as_deref(),
        }
    }

    pub fn has_default(&self) -> bool {
        match self {
            Property::String(p) => p.default.is_some(),
            Property::Integer(p) => p.default.is_some(),
            Property::Number(p) => p.default.is_some(),
            Property::Boolean(p) => p.default.is_some(),
            Property::Array(_) | Property::Object(_) => false,
        }
    }

    /// Default value rendered as JSON
    pub fn default_json(&self) -> Option<String> {
        match self {
            Property::String(p) => p
                .default
                .as_ref()
                .map(|d| serde_json::Value::String(d.clone()).to_string()),
            Property::Integer(p) => p.default.map(|d| d.to_string()),
            Property::Number(p) => p.default.as_ref().map(Number::to_string),
            Property::Boolean(p) => p.default.map(|d| d.to_string()),
            Property::Array(_) | Property::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&PropertyObject> {
        match self {
            Property::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PropertyArray> {
        match self {
            Property::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Direct children, in declaration order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Property::Object(o) => o.items.iter().map(|i| i.property).collect(),
            Property::Array(a) => vec![a.items],
            _ => Vec::new(),
        }
    }
}

/// Back-references filled after construction; the first assignment wins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub parent: Option<NodeId>,
    pub file_name: Option<PathBuf>,
    /// Set on nodes that are the root of their own schema file
    pub file_root: bool,
}

impl Meta {
    pub fn set_parent(&mut self, parent: NodeId) -> bool {
        if self.parent.is_some() {
            return false;
        }
        self.parent = Some(parent);
        true
    }

    pub fn set_file_name(&mut self, file: &Path) -> bool {
        if self.file_name.is_some() {
            return false;
        }
        self.file_name = Some(file.to_path_buf());
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub property: Property,
    pub meta: Meta,
}

/// Arena owning every node of one generation run
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<Node>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: Property) -> NodeId {
        self.nodes.push(Node {
            property,
            meta: Meta::default(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Reserve a slot that is filled once the node has been built
    pub fn reserve(&mut self) -> NodeId {
        self.add(Property::Object(PropertyObject::default()))
    }

    pub fn replace(&mut self, id: NodeId, property: Property) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.property = property;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Panics on ids from another graph
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn property(&self, id: NodeId) -> &Property {
        &self.node(id).property
    }

    pub fn meta(&self, id: NodeId) -> &Meta {
        &self.node(id).meta
    }

    pub fn meta_mut(&mut self, id: NodeId) -> &mut Meta {
        &mut self.nodes[id.0].meta
    }

    pub fn kind(&self, id: NodeId) -> PropertyKind {
        self.property(id).kind()
    }

    pub fn object(&self, id: NodeId) -> Option<&PropertyObject> {
        self.property(id).as_object()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.meta(id).parent
    }

    pub fn file_name(&self, id: NodeId) -> Option<&Path> {
        self.meta(id).file_name.as_deref()
    }

    /// Innermost non-array node of an array chain
    pub fn array_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Property::Array(a) = self.property(current) {
            current = a.items;
        }
        current
    }

    /// Number of array levels starting at `id`
    pub fn array_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Property::Array(a) = self.property(current) {
            depth += 1;
            current = a.items;
        }
        depth
    }

    /// Set parents and inherit file identity below `root`, post-order
    pub fn link_meta(&mut self, root: NodeId) {
        let mut visited = HashSet::new();
        self.link_node(root, &mut visited);
    }

    fn link_node(&mut self, id: NodeId, visited: &mut HashSet<NodeId>) {
        if !visited.insert(id) {
            return;
        }
        let file = self.meta(id).file_name.clone();
        for child in self.property(id).children() {
            if child != id {
                let meta = self.meta_mut(child);
                meta.set_parent(id);
                if !meta.file_root {
                    if let Some(file) = &file {
                        meta.set_file_name(file);
                    }
                }
            }
            self.link_node(child, visited);
        }
    }

    /// Object schemas reachable from `root`, root first, each once
    pub fn objects(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if self.kind(id) == PropertyKind::Object {
                out.push(id);
            }
            let mut children = self.property(id).children();
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> Property {
        Property::Boolean(PropertyBoolean::default())
    }

    #[test]
    fn test_meta_first_assignment_wins() {
        let mut meta = Meta::default();
        assert!(meta.set_parent(NodeId(1)));
        assert!(!meta.set_parent(NodeId(2)));
        assert_eq!(meta.parent, Some(NodeId(1)));
        assert!(meta.set_file_name(Path::new("/a.json")));
        assert!(!meta.set_file_name(Path::new("/b.json")));
        assert_eq!(meta.file_name, Some(PathBuf::from("/a.json")));
    }

    #[test]
    fn test_array_depth_and_leaf() {
        let mut graph = SchemaGraph::new();
        let mut current = graph.add(leaf());
        let leaf_id = current;
        for _ in 0..4 {
            current = graph.add(Property::Array(PropertyArray {
                description: None,
                reference: None,
                items: current,
                items_reference: None,
            }));
        }
        assert_eq!(graph.array_depth(current), 4);
        assert_eq!(graph.array_leaf(current), leaf_id);
        assert_eq!(graph.array_depth(leaf_id), 0);
    }

    #[test]
    fn test_link_meta_handles_cycles() {
        let mut graph = SchemaGraph::new();
        let root = graph.reserve();
        graph.meta_mut(root).set_file_name(Path::new("/a.json"));
        graph.meta_mut(root).file_root = true;
        let member = graph.add(leaf());
        graph.replace(
            root,
            Property::Object(PropertyObject {
                id: Some("A".into()),
                title: Some("A".into()),
                declares_properties: true,
                items: vec![
                    PropertyItem {
                        name: "self".into(),
                        idx: 0,
                        optional: true,
                        property: root,
                        reference: Some(RefSite::new("file://a.json")),
                    },
                    PropertyItem {
                        name: "flag".into(),
                        idx: 1,
                        optional: true,
                        property: member,
                        reference: None,
                    },
                ],
                ..Default::default()
            }),
        );
        graph.link_meta(root);
        assert_eq!(graph.parent(member), Some(root));
        assert_eq!(graph.file_name(member), Some(Path::new("/a.json")));
        assert_eq!(graph.objects(root), vec![root]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(PropertyKind::ObjectItem.as_str(), "objectitem");
        assert_eq!(PropertyKind::ArrayItem.to_string(), "arrayitem");
        assert_eq!(StringFormat::parse("date-time"), StringFormat::DateTime);
        assert_eq!(StringFormat::parse("uuid").as_str(), "uuid");
        assert_eq!(IntegerFormat::parse("int16"), Some(IntegerFormat::Int16));
        assert_eq!(NumberFormat::parse("float128"), None);
    }
}

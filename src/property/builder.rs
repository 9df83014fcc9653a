//! IR construction from documents

use super::coerce;
use super::{
    IntegerFormat, NodeId, NumberFormat, Property, PropertyArray, PropertyBoolean,
    PropertyInteger, PropertyItem, PropertyNumber, PropertyObject, PropertyString, RefSite,
    SchemaGraph, StringFormat,
};
use crate::document::{kind_of, Document};
use crate::error::{Error, Result};
use crate::registry::Registry;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds [`Property`] nodes into a graph, loading refs through a registry
pub struct PropertyBuilder<'a> {
    registry: &'a mut Registry,
    graph: &'a mut SchemaGraph,
    ref_chain: HashSet<PathBuf>,
}

impl<'a> PropertyBuilder<'a> {
    pub fn new(registry: &'a mut Registry, graph: &'a mut SchemaGraph) -> Self {
        Self {
            registry,
            graph,
            ref_chain: HashSet::new(),
        }
    }

    /// Load the schema a `file://` ref points at and build it
    pub fn load_root(&mut self, reference: &str) -> Result<NodeId> {
        let root = self.build_ref(reference, None)?;
        self.graph.link_meta(root);
        Ok(root)
    }

    /// Build a document; `file` is the file refs inside it resolve against
    pub fn from_document(&mut self, doc: &Document, file: Option<&Path>) -> Result<NodeId> {
        let root = self.build_node(doc, file)?;
        if let Some(file) = file {
            self.graph.meta_mut(root).set_file_name(file);
        }
        self.graph.link_meta(root);
        Ok(root)
    }

    fn build_node(&mut self, doc: &Document, file: Option<&Path>) -> Result<NodeId> {
        if let Some(site) = ref_site(doc) {
            return self.build_ref(&site.reference, file);
        }
        let property = self.build_property(doc, file)?;
        Ok(self.graph.add(property))
    }

    fn build_ref(&mut self, reference: &str, file: Option<&Path>) -> Result<NodeId> {
        let resolved = self.registry.resolve(file, reference)?;
        if let Some(node) = resolved.node {
            debug!(reference, node = %node, "reusing built schema");
            return Ok(node);
        }
        let target = resolved.file;
        if !self.ref_chain.insert(target.clone()) {
            return Err(Error::Resolution(format!(
                "{:?} only refers back to itself",
                reference
            )));
        }

        let result = if let Some(inner) = resolved.document.get_str("$ref").filter(|_| {
            !resolved.document.contains_key("type")
        }) {
            let inner = inner.to_string();
            self.build_ref(&inner, Some(&target)).inspect(|&node| {
                self.registry.set_node(&target, node);
            })
        } else {
            let slot = self.graph.reserve();
            {
                let meta = self.graph.meta_mut(slot);
                meta.file_root = true;
                meta.set_file_name(&target);
            }
            self.registry.set_node(&target, slot);
            self.build_property(&resolved.document, Some(&target))
                .map(|property| {
                    self.graph.replace(slot, property);
                    slot
                })
        };
        self.ref_chain.remove(&target);
        result
    }

    fn build_property(&mut self, doc: &Document, file: Option<&Path>) -> Result<Property> {
        let description = doc.get_str("description").map(str::to_string);
        let reference = doc.get_str("$ref").map(str::to_string);
        let typ = match doc.get("type") {
            Some(Value::String(t)) => t.as_str(),
            Some(other) => {
                return Err(structural(
                    doc,
                    vec![format!("type must be a string, found {}", kind_of(other))],
                ))
            }
            None => return Err(structural(doc, vec!["missing type".to_string()])),
        };

        match typ {
            "object" => self.build_object(doc, file, description, reference),
            "array" => self.build_array(doc, file, description, reference),
            "string" => build_string(doc, description, reference),
            "integer" => build_integer(doc, description, reference),
            "number" => build_number(doc, description, reference),
            "boolean" => build_boolean(doc, description, reference),
            other => Err(structural(doc, vec![format!("unknown type: {}", other)])),
        }
    }

    fn build_object(
        &mut self,
        doc: &Document,
        file: Option<&Path>,
        description: Option<String>,
        reference: Option<String>,
    ) -> Result<Property> {
        let mut errors = Vec::new();

        let required = match doc.get("required") {
            None => None,
            Some(Value::Array(values)) => {
                let mut names = Vec::with_capacity(values.len());
                for (i, value) in values.iter().enumerate() {
                    match value.as_str() {
                        Some(name) => names.push(name.to_string()),
                        None => errors.push(format!(
                            "required[{}] must be a string, found {}",
                            i,
                            kind_of(value)
                        )),
                    }
                }
                Some(names)
            }
            Some(other) => {
                errors.push(format!("required must be an array, found {}", kind_of(other)));
                None
            }
        };
        let is_required =
            |name: &str| required.as_ref().is_some_and(|r| r.iter().any(|n| n == name));

        let mut items = Vec::new();
        let mut declared = 0;
        let declares_properties = doc.contains_key("properties");
        match doc.get("properties") {
            None => {}
            Some(Value::Object(members)) => {
                declared = members.len();
                for (idx, (name, value)) in members.iter().enumerate() {
                    let Value::Object(member) = value else {
                        errors.push(format!("{}: must be an object, found {}", name, kind_of(value)));
                        continue;
                    };
                    let member = Document::from(member.clone());
                    match self.build_node(&member, file) {
                        Ok(node) => items.push(PropertyItem {
                            name: name.clone(),
                            idx,
                            optional: !is_required(name),
                            property: node,
                            reference: ref_site(&member),
                        }),
                        Err(Error::Structural { errors: nested, .. }) => {
                            errors.extend(nested.into_iter().map(|e| format!("{}: {}", name, e)))
                        }
                        Err(Error::UnsupportedShape(msg)) => {
                            errors.push(format!("{}: {}", name, msg))
                        }
                        Err(fatal) => return Err(fatal),
                    }
                }
            }
            Some(other) => errors.push(format!(
                "properties must be an object, found {}",
                kind_of(other)
            )),
        }

        let id = doc.get_str("$id").map(str::to_string);
        if declared > 0 && id.as_deref().unwrap_or_default().is_empty() {
            errors.push("object with properties needs a non-empty $id".to_string());
        }

        if !errors.is_empty() {
            return Err(structural(doc, errors));
        }

        Ok(Property::Object(PropertyObject {
            id,
            schema: doc.get_str("$schema").map(str::to_string),
            title: doc.get_str("title").map(str::to_string),
            description,
            reference,
            declares_properties,
            items,
            required,
        }))
    }

    fn build_array(
        &mut self,
        doc: &Document,
        file: Option<&Path>,
        description: Option<String>,
        reference: Option<String>,
    ) -> Result<Property> {
        let Some(items) = doc.get_document("items") else {
            return Err(structural(doc, vec!["array without items".to_string()]));
        };
        let node = self.build_node(&items, file)?;
        Ok(Property::Array(PropertyArray {
            description,
            reference,
            items: node,
            items_reference: ref_site(&items),
        }))
    }
}

fn build_string(
    doc: &Document,
    description: Option<String>,
    reference: Option<String>,
) -> Result<Property> {
    let default = doc
        .get("default")
        .map(coerce::string_default)
        .transpose()
        .map_err(|e| structural(doc, vec![e]))?;
    Ok(Property::String(PropertyString {
        description,
        reference,
        default,
        format: doc.get_str("format").map(StringFormat::parse),
    }))
}

fn build_integer(
    doc: &Document,
    description: Option<String>,
    reference: Option<String>,
) -> Result<Property> {
    let mut errors = Vec::new();
    let format = match doc.get_str("format") {
        None => None,
        Some(f) => IntegerFormat::parse(f).or_else(|| {
            errors.push(format!("unknown integer format: {}", f));
            None
        }),
    };
    let default = collect(doc.get("default").map(coerce::integer_default), &mut errors);
    let minimum = collect(doc.get("minimum").map(coerce::integer_bound), &mut errors);
    let maximum = collect(doc.get("maximum").map(coerce::integer_bound), &mut errors);
    if !errors.is_empty() {
        return Err(structural(doc, errors));
    }
    Ok(Property::Integer(PropertyInteger {
        description,
        reference,
        default,
        format,
        minimum,
        maximum,
    }))
}

fn build_number(
    doc: &Document,
    description: Option<String>,
    reference: Option<String>,
) -> Result<Property> {
    let mut errors = Vec::new();
    let format = match doc.get_str("format") {
        None => None,
        Some(f) => NumberFormat::parse(f).or_else(|| {
            errors.push(format!("unknown number format: {}", f));
            None
        }),
    };
    let default = collect(doc.get("default").map(coerce::number_default), &mut errors);
    let minimum = collect(doc.get("minimum").map(coerce::number_bound), &mut errors);
    let maximum = collect(doc.get("maximum").map(coerce::number_bound), &mut errors);
    if !errors.is_empty() {
        return Err(structural(doc, errors));
    }
    Ok(Property::Number(PropertyNumber {
        description,
        reference,
        default,
        format,
        minimum,
        maximum,
    }))
}

fn build_boolean(
    doc: &Document,
    description: Option<String>,
    reference: Option<String>,
) -> Result<Property> {
    let default = doc
        .get("default")
        .map(coerce::boolean_default)
        .transpose()
        .map_err(|e| structural(doc, vec![e]))?;
    Ok(Property::Boolean(PropertyBoolean {
        description,
        reference,
        default,
    }))
}

/// Documents without a `type` are followed through their `$ref`
fn ref_site(doc: &Document) -> Option<RefSite> {
    if doc.contains_key("type") {
        return None;
    }
    doc.get_str("$ref").map(|reference| RefSite {
        reference: reference.to_string(),
        description: doc.get_str("description").map(str::to_string),
    })
}

fn collect<T>(value: Option<std::result::Result<T, String>>, errors: &mut Vec<String>) -> Option<T> {
    match value {
        Some(Ok(v)) => Some(v),
        Some(Err(e)) => {
            errors.push(e);
            None
        }
        None => None,
    }
}

fn structural(doc: &Document, errors: Vec<String>) -> Error {
    let context = doc
        .get_str("title")
        .or_else(|| doc.get_str("$id"))
        .or_else(|| doc.get_str("type"))
        .unwrap_or("schema")
        .to_string();
    Error::Structural { context, errors }
}

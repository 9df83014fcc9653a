//! Code rendering: generate builders and factories from schemas
//!
//! One output unit per object schema. The driver walks a work-list seeded
//! with the root object; every unit reports the object schemas it refers
//! to and the registry makes sure each schema is emitted once.

pub mod arrays;
mod go;
mod typescript;

pub use go::{GoBackend, RUSTY_IMPORT, WUESTE_IMPORT};
pub use typescript::TypeScriptBackend;

use crate::config::{EntityConfig, GeneratorConfig};
use crate::error::{Error, Result};
use crate::fixtures;
use crate::property::{to_document, NodeId, PropertyBuilder, PropertyObject, SchemaGraph};
use crate::registry::Registry;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Target language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    #[default]
    #[serde(rename = "ts", alias = "typescript")]
    TypeScript,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "go" | "golang" => Some(Language::Go),
            "ts" | "typescript" => Some(Language::TypeScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::TypeScript => "ts",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Include provenance header
    pub provenance: bool,
    /// One indentation step
    pub indent: String,
    /// Go package name
    pub package_name: String,
    /// TypeScript import path of the wueste runtime
    pub from_wueste: String,
    /// TypeScript import path of the result type
    pub from_result: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from(&EntityConfig::default())
    }
}

impl From<&EntityConfig> for RenderConfig {
    fn from(entity: &EntityConfig) -> Self {
        Self {
            provenance: entity.provenance,
            indent: entity.indent.clone(),
            package_name: entity.package_name.clone(),
            from_wueste: entity.from_wueste.clone(),
            from_result: entity.from_result.clone(),
        }
    }
}

/// Everything a backend may read while emitting one unit
#[derive(Debug, Clone, Copy)]
pub struct GenerateContext<'a> {
    pub graph: &'a SchemaGraph,
    pub config: &'a RenderConfig,
}

/// One generated output file
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedUnit {
    /// File name relative to the output directory
    pub file_name: String,
    pub contents: String,
    /// Object schemas this unit refers to
    pub discovered: Vec<NodeId>,
    /// Human readable origin, for logging
    pub source: String,
}

/// A target language emitter
pub trait Backend {
    fn language(&self) -> Language;

    /// Output file name of the unit for `object`; also its dedup key
    fn file_name(&self, graph: &SchemaGraph, object: NodeId) -> String;

    fn generate(&mut self, ctx: &GenerateContext<'_>, object: NodeId) -> Result<GeneratedUnit>;
}

pub fn backend_for(language: Language) -> Box<dyn Backend> {
    match language {
        Language::Go => Box::new(GoBackend),
        Language::TypeScript => Box::new(TypeScriptBackend),
    }
}

/// Generate the unit for `root` and every object schema reachable from it
pub fn generate(
    graph: &SchemaGraph,
    registry: &mut Registry,
    root: NodeId,
    backend: &mut dyn Backend,
    config: &RenderConfig,
) -> Result<Vec<GeneratedUnit>> {
    if graph.object(root).is_none() {
        return Err(Error::UnsupportedShape(format!(
            "root schema must be an object, found {}",
            graph.kind(root)
        )));
    }
    let ctx = GenerateContext { graph, config };
    let mut units = Vec::new();
    let mut work = vec![root];
    while let Some(id) = work.pop() {
        let Some(object) = graph.object(id) else {
            continue;
        };
        if !object.has_members() && id != root {
            continue;
        }
        let meta = graph.meta(id);
        if meta.file_root {
            if let Some(file) = &meta.file_name {
                if !registry.mark_emitted(file) {
                    debug!(file = %file.display(), "already emitted");
                    continue;
                }
            }
        }
        let file_name = backend.file_name(graph, id);
        if !registry.claim_unit(&file_name) {
            debug!(unit = %file_name, "unit already claimed");
            continue;
        }
        let unit = backend.generate(&ctx, id)?;
        work.extend(unit.discovered.iter().rev().copied());
        units.push(unit);
    }
    Ok(units)
}

/// Write a unit through a temp file in `dir`, then rename it into place
pub fn write_unit(dir: &Path, unit: &GeneratedUnit) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(&unit.file_name);
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}", unit.file_name))
        .tempfile_in(dir)?;
    tmp.write_all(unit.contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
    Ok(target)
}

/// Load every configured input and write its units; returns the written paths
pub fn run(config: &GeneratorConfig) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let mut inputs = config.input_files.clone();
    if config.write_test_schema {
        let path = fixtures::write_test_schema(&config.output_dir)?;
        info!("Wrote schema to -> {}", path.display());
        if inputs.is_empty() {
            inputs.push(path);
        }
    }

    let render_config = RenderConfig::from(&config.entity);
    let mut backend = backend_for(config.entity.language);
    let mut registry = Registry::default().with_include_dirs(config.include_dirs.iter());
    let mut graph = SchemaGraph::new();
    let mut written = Vec::new();
    for input in &inputs {
        let reference = format!("file://{}", input.display());
        let root = PropertyBuilder::new(&mut registry, &mut graph).load_root(&reference)?;
        if graph.object(root).is_some_and(|o| !o.has_members()) {
            warn!(input = %input.display(), "schema declares no properties");
        }
        let units = generate(&graph, &mut registry, root, backend.as_mut(), &render_config)?;
        for unit in units {
            let path = write_unit(&config.output_dir, &unit)?;
            info!("Generate: {} -> {}", unit.source, path.display());
            written.push(path);
        }
    }
    Ok(written)
}

/// Every member needs its own non-empty identifier under `name`
pub(crate) fn check_member_names(
    schema: &PropertyObject,
    name: fn(&str) -> String,
) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for item in &schema.items {
        let ident = name(&item.name);
        if ident.is_empty() {
            return Err(Error::UnsupportedShape(format!(
                "{}.{}: member name yields an empty identifier",
                schema.title(),
                item.name
            )));
        }
        if let Some(other) = seen.insert(ident.clone(), &item.name) {
            return Err(Error::UnsupportedShape(format!(
                "{}.{}: identifier {} is already used by member {:?}",
                schema.title(),
                item.name,
                ident,
                other
            )));
        }
    }
    Ok(())
}

/// Where a schema node came from, for headers and logs
pub(crate) fn source_name(graph: &SchemaGraph, id: NodeId) -> String {
    let title = graph.object(id).map(|o| o.title()).unwrap_or_default();
    match graph.file_name(id) {
        Some(file) if graph.meta(id).file_root || graph.parent(id).is_none() => {
            file.display().to_string()
        }
        Some(file) => format!("{}#{}", file.display(), title),
        None => title.to_string(),
    }
}

/// Hex sha256 of the schema as it serializes back to JSON
pub fn schema_hash(graph: &SchemaGraph, id: NodeId) -> String {
    let json = to_document(graph, id).to_json();
    hex::encode(Sha256::digest(json.as_bytes()))
}

/// `//` comment lines heading every generated file when provenance is on
pub(crate) fn provenance_lines(graph: &SchemaGraph, id: NodeId) -> Vec<String> {
    vec![
        format!("// GENERATED FROM: {}", source_name(graph, id)),
        format!("// SCHEMA HASH: {}", schema_hash(graph, id)),
        format!("// GENERATED: {}", Utc::now().to_rfc3339()),
        "// DO NOT EDIT".to_string(),
    ]
}

// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # wueste-gen: schema-driven entity generator
//!
//! Reads JSON-Schema files (joined by `file://` refs), builds one typed
//! property graph, and emits builders and factories for Go and TypeScript.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wueste_gen::{generate, GoBackend, PropertyBuilder, Registry, RenderConfig, SchemaGraph};
//!
//! let mut registry = Registry::default();
//! let mut graph = SchemaGraph::new();
//! let root = PropertyBuilder::new(&mut registry, &mut graph)
//!     .load_root("file://schema/base.schema.json")?;
//!
//! let units = generate(&graph, &mut registry, root, &mut GoBackend, &RenderConfig::default())?;
//! for unit in units {
//!     println!("{}:\n{}", unit.file_name, unit.contents);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                                                             │
//! │  file://base.schema.json                                    │
//! │       │                                                     │
//! │       ├──► Registry::resolve ──► Document (ordered JSON)    │
//! │       │         (include dirs, one read per file)           │
//! │       │                                                     │
//! │       └──► PropertyBuilder ──► SchemaGraph (arena of nodes) │
//! │                                    │                        │
//! │            to_document ◄───────────┤  (byte-exact round trip)│
//! │                                    │                        │
//! │            render::generate ◄──────┘                        │
//! │                 │                                           │
//! │                 ├──► GoBackend ──► <title>.go               │
//! │                 └──► TypeScriptBackend ──► <name>.ts        │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every object schema becomes one output unit. The registry remembers
//! which files and unit names were emitted, so a schema reached through
//! several refs is written once.

pub mod config;
pub mod document;
pub mod error;
pub mod fixtures;
pub mod loader;
pub mod property;
pub mod registry;
pub mod render;
pub mod util;
pub mod writer;

// Re-exports
pub use config::{EntityConfig, GeneratorConfig};
pub use document::Document;
pub use error::{Error, Result};
pub use loader::{FsLoader, MemoryLoader, SchemaLoader};
pub use property::{
    coerce, to_document, Meta, NodeId, Property, PropertyArray, PropertyBoolean, PropertyBuilder,
    PropertyInteger, PropertyItem, PropertyKind, PropertyNumber, PropertyObject, PropertyString,
    RefSite, SchemaGraph, StringFormat,
};
pub use registry::Registry;
pub use render::{
    backend_for, generate, run, write_unit, Backend, GenerateContext, GeneratedUnit, GoBackend,
    Language, RenderConfig, TypeScriptBackend,
};
pub use writer::BlockWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Schema registry
//!
//! Resolves `file://` refs to absolute file identities, parses each file at
//! most once, and records which schemas have already been generated. One
//! registry lives for exactly one generation run.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::loader::{FsLoader, SchemaLoader};
use crate::property::NodeId;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const FILE_SCHEME: &str = "file://";

/// One parsed schema file
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Absolute file identity
    pub file: PathBuf,
    /// The ref string that first loaded the file
    pub reference: String,
    pub document: Document,
    /// Root IR node built from the document, once construction has started
    pub node: Option<NodeId>,
    pub emitted: bool,
}

/// Outcome of a successful ref resolution
#[derive(Debug, Clone)]
pub struct Resolved {
    pub file: PathBuf,
    pub document: Document,
    pub node: Option<NodeId>,
    /// True when the file was already registered
    pub cached: bool,
}

pub struct Registry {
    loader: Box<dyn SchemaLoader>,
    include_dirs: Vec<PathBuf>,
    entries: IndexMap<PathBuf, RegistryEntry>,
    keys: HashMap<String, PathBuf>,
    units: IndexSet<String>,
    reads: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(FsLoader)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("include_dirs", &self.include_dirs)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("units", &self.units)
            .finish()
    }
}

impl Registry {
    pub fn new(loader: impl SchemaLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            include_dirs: Vec::new(),
            entries: IndexMap::new(),
            keys: HashMap::new(),
            units: IndexSet::new(),
            reads: 0,
        }
    }

    pub fn with_include_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    /// Resolve `reference` relative to `parent_file` and load its document
    pub fn resolve(&mut self, parent_file: Option<&Path>, reference: &str) -> Result<Resolved> {
        let file = self.locate(parent_file, reference)?;

        if let Some(entry) = self.entries.get(&file) {
            debug!(reference, file = %file.display(), "ref cache hit");
            return Ok(Resolved {
                file,
                document: entry.document.clone(),
                node: entry.node,
                cached: true,
            });
        }

        debug!(reference, file = %file.display(), "loading schema");
        let text = self.loader.read_to_string(&file)?;
        self.reads += 1;
        let document = Document::parse_from(&text, &file)?;
        self.register(file.clone(), reference.trim(), document.clone());
        Ok(Resolved {
            file,
            document,
            node: None,
            cached: false,
        })
    }

    /// Map a ref string to an absolute file identity without reading it
    pub fn locate(&self, parent_file: Option<&Path>, reference: &str) -> Result<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() || reference.starts_with('#') {
            return Err(Error::Resolution(format!(
                "local ref not supported: {:?}",
                reference
            )));
        }
        let Some(raw) = reference.strip_prefix(FILE_SCHEME) else {
            return Err(Error::Resolution(format!(
                "only file:// ref supported: {:?}",
                reference
            )));
        };
        let path = Path::new(raw);

        let mut searched = Vec::new();
        let base = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let dir = parent_file
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.loader.current_dir());
            dir.join(path)
        };
        searched.push(base);
        if !path.is_absolute() {
            searched.extend(self.include_dirs.iter().map(|dir| dir.join(path)));
        }

        for candidate in &searched {
            if self.loader.exists(candidate) {
                return self.loader.absolute(candidate);
            }
        }

        let tried: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
        Err(Error::Resolution(format!(
            "cannot find {:?} (searched: {})",
            reference,
            tried.join(", ")
        )))
    }

    /// Register a document that did not come from a ref, e.g. a built-in schema
    pub fn register(&mut self, file: PathBuf, reference: &str, document: Document) {
        if let Some(id) = document.get_str("$id") {
            if !id.is_empty() {
                self.keys.entry(id.to_string()).or_insert_with(|| file.clone());
            }
        }
        if !reference.is_empty() {
            self.keys
                .entry(reference.to_string())
                .or_insert_with(|| file.clone());
        }
        self.entries.entry(file.clone()).or_insert(RegistryEntry {
            file,
            reference: reference.to_string(),
            document,
            node: None,
            emitted: false,
        });
    }

    pub fn entry(&self, file: &Path) -> Option<&RegistryEntry> {
        self.entries.get(file)
    }

    /// Lookup by the ref string that loaded a file or by its root `$id`
    pub fn entry_by_key(&self, key: &str) -> Option<&RegistryEntry> {
        self.keys.get(key).and_then(|file| self.entries.get(file))
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files actually read through the loader
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn node(&self, file: &Path) -> Option<NodeId> {
        self.entries.get(file).and_then(|e| e.node)
    }

    pub fn set_node(&mut self, file: &Path, node: NodeId) {
        if let Some(entry) = self.entries.get_mut(file) {
            entry.node = Some(node);
        }
    }

    pub fn is_emitted(&self, file: &Path) -> bool {
        self.entries.get(file).is_some_and(|e| e.emitted)
    }

    /// Returns true when the file was not marked before
    pub fn mark_emitted(&mut self, file: &Path) -> bool {
        match self.entries.get_mut(file) {
            Some(entry) if !entry.emitted => {
                entry.emitted = true;
                true
            }
            _ => false,
        }
    }

    /// Claim an output unit name; false when it was already generated
    pub fn claim_unit(&mut self, name: &str) -> bool {
        self.units.insert(name.to_string())
    }

    pub fn emitted_units(&self) -> impl Iterator<Item = &String> {
        self.units.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use rstest::rstest;

    fn registry() -> Registry {
        let loader = MemoryLoader::new("/abs")
            .with_file("/abs/base.json", r#"{"$id":"https://Base","type":"object"}"#)
            .with_file("/abs/dir/sub.json", r#"{"$id":"https://Sub","type":"object"}"#)
            .with_file("/inc/shared.json", r#"{"type":"object"}"#)
            .with_file("/abs/broken.json", "{");
        Registry::new(loader).with_include_dirs(["/inc"])
    }

    #[rstest]
    #[case("#/definitions/x", "local ref not supported")]
    #[case("", "local ref not supported")]
    #[case("https://example.com/x.json", "only file:// ref supported")]
    #[case("sub.json", "only file:// ref supported")]
    fn test_rejected_refs(#[case] reference: &str, #[case] message: &str) {
        let mut reg = registry();
        let err = reg.resolve(None, reference).unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
        assert!(err.to_string().contains(message), "{}", err);
    }

    #[test]
    fn test_relative_to_parent_then_include_dirs() {
        let mut reg = registry();
        let base = reg.resolve(None, "file://base.json").unwrap();
        assert_eq!(base.file, PathBuf::from("/abs/base.json"));

        let sub = reg
            .resolve(Some(&base.file), " file://dir/sub.json ")
            .unwrap();
        assert_eq!(sub.file, PathBuf::from("/abs/dir/sub.json"));

        let shared = reg.resolve(Some(&sub.file), "file://shared.json").unwrap();
        assert_eq!(shared.file, PathBuf::from("/inc/shared.json"));
    }

    #[test]
    fn test_resolving_twice_reads_once() {
        let mut reg = registry();
        let first = reg.resolve(None, "file://base.json").unwrap();
        let second = reg.resolve(None, "file:///abs/base.json").unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.file, second.file);
        assert_eq!(reg.reads(), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_lookup_by_ref_and_id() {
        let mut reg = registry();
        reg.resolve(None, "file://base.json").unwrap();
        let by_ref = reg.entry_by_key("file://base.json").unwrap();
        let by_id = reg.entry_by_key("https://Base").unwrap();
        assert_eq!(by_ref.file, by_id.file);
    }

    #[test]
    fn test_missing_file_lists_search_path() {
        let mut reg = registry();
        let err = reg.resolve(None, "file://nope.json").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/abs/nope.json"), "{}", msg);
        assert!(msg.contains("/inc/nope.json"), "{}", msg);
    }

    #[test]
    fn test_malformed_json_is_load_error() {
        let mut reg = registry();
        let err = reg.resolve(None, "file://broken.json").unwrap_err();
        match err {
            Error::Load { path, .. } => assert_eq!(path, PathBuf::from("/abs/broken.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_emitted_flags() {
        let mut reg = registry();
        let base = reg.resolve(None, "file://base.json").unwrap();
        assert!(!reg.is_emitted(&base.file));
        assert!(reg.mark_emitted(&base.file));
        assert!(!reg.mark_emitted(&base.file));
        assert!(reg.is_emitted(&base.file));

        assert!(reg.claim_unit("Base$inner"));
        assert!(!reg.claim_unit("Base$inner"));
    }
}

//! Schema file access
//!
//! The registry reads schema files through [`SchemaLoader`], so tests and
//! embedders can serve schemas from memory instead of the filesystem.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Read access to schema files
pub trait SchemaLoader {
    /// Directory relative refs resolve against when there is no parent file
    fn current_dir(&self) -> PathBuf;

    fn exists(&self, path: &Path) -> bool;

    /// Absolute identity of an existing file
    fn absolute(&self, path: &Path) -> Result<PathBuf>;

    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Loader backed by the real filesystem
#[derive(Debug, Clone, Default)]
pub struct FsLoader;

impl SchemaLoader for FsLoader {
    fn current_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path).map_err(|e| Error::load(path, e))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::load(path, e))
    }
}

/// Loader serving files from an in-memory map
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    cwd: PathBuf,
    files: HashMap<PathBuf, String>,
}

impl Default for MemoryLoader {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryLoader {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            files: HashMap::new(),
        }
    }

    /// Add a file; relative paths are taken relative to the loader's cwd
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = normalize(&self.cwd.join(path.as_ref()));
        self.files.insert(path, content.into());
    }
}

impl SchemaLoader for MemoryLoader {
    fn current_dir(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize(&self.cwd.join(path)))
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        Ok(normalize(&self.cwd.join(path)))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = normalize(&self.cwd.join(path));
        self.files
            .get(&path)
            .cloned()
            .ok_or_else(|| Error::load(path, "no such file"))
    }
}

/// Resolve `.` and `..` lexically
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c.json")), PathBuf::from("/a/c.json"));
        assert_eq!(normalize(Path::new("/a/b/../../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_memory_loader_relative_to_cwd() {
        let loader = MemoryLoader::new("/abs").with_file("sub.json", "{}");
        assert!(loader.exists(Path::new("/abs/sub.json")));
        assert!(loader.exists(Path::new("sub.json")));
        assert!(!loader.exists(Path::new("/other/sub.json")));
        assert_eq!(
            loader.absolute(Path::new("./sub.json")).unwrap(),
            PathBuf::from("/abs/sub.json")
        );
        assert_eq!(loader.read_to_string(Path::new("sub.json")).unwrap(), "{}");
    }

    #[test]
    fn test_memory_loader_missing_file() {
        let loader = MemoryLoader::default();
        let err = loader.read_to_string(Path::new("/nope.json")).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_fs_loader_reads_and_canonicalizes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        std::fs::write(&file, "{}").unwrap();
        let loader = FsLoader;
        assert!(loader.exists(&file));
        assert_eq!(loader.read_to_string(&file).unwrap(), "{}");
        let abs = loader.absolute(&dir.path().join("./a.json")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("a.json"));
    }
}

//! Generator configuration
//!
//! A run is described by a [`GeneratorConfig`], loaded from YAML and then
//! overridden by command line flags. Backend specific knobs live in
//! [`EntityConfig`].

use crate::error::{Error, Result};
use crate::render::Language;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directories searched for `file://` refs after the referencing file's own
    pub include_dirs: Vec<PathBuf>,

    /// Where generated files are written
    pub output_dir: PathBuf,

    /// Root schema files, each generated separately
    pub input_files: Vec<PathBuf>,

    /// Write the built-in `SimpleType` schema into the output directory
    pub write_test_schema: bool,

    pub entity: EntityConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            output_dir: PathBuf::from("./"),
            input_files: Vec::new(),
            write_test_schema: false,
            entity: EntityConfig::default(),
        }
    }
}

/// Settings for the emitted code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EntityConfig {
    /// Target language
    pub language: Language,

    /// One indentation step
    pub indent: String,

    /// Go package name
    pub package_name: String,

    /// TypeScript import path of the wueste runtime
    pub from_wueste: String,

    /// TypeScript import path of the `Result` type
    pub from_result: String,

    /// Head every file with its schema source, hash and generation time
    pub provenance: bool,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            indent: "  ".to_string(),
            package_name: "please_set_this".to_string(),
            from_wueste: "wueste/wueste".to_string(),
            from_result: "wueste/result".to_string(),
            provenance: false,
        }
    }
}

impl GeneratorConfig {
    /// Load a YAML config file; absent keys keep their defaults
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_norway::from_str(content)?)
    }

    /// JSON schema of the config file format
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(GeneratorConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Reject settings no backend can work with
    pub fn validate(&self) -> Result<()> {
        if self.entity.indent.is_empty() {
            return Err(Error::Config("entity.indent must not be empty".into()));
        }
        if self.entity.language == Language::Go && self.entity.package_name.trim().is_empty() {
            return Err(Error::Config(
                "entity.package_name is required for go output".into(),
            ));
        }
        if self.input_files.is_empty() && !self.write_test_schema {
            return Err(Error::Config(
                "no input file given (use --input-file or --write-test-schema)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("./"));
        assert_eq!(config.entity.language, Language::TypeScript);
        assert_eq!(config.entity.indent, "  ");
        assert_eq!(config.entity.package_name, "please_set_this");
        assert!(!config.entity.provenance);
    }

    #[test]
    fn test_yaml_overrides_only_given_keys() {
        let config = GeneratorConfig::from_yaml(
            r#"
output_dir: out
input_files:
  - schema/base.schema.json
entity:
  language: go
  package_name: entity
"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.input_files.len(), 1);
        assert_eq!(config.entity.language, Language::Go);
        assert_eq!(config.entity.package_name, "entity");
        assert_eq!(config.entity.from_wueste, "wueste/wueste");
        config.validate().unwrap();
    }

    #[test]
    fn test_typescript_alias() {
        let config = GeneratorConfig::from_yaml("entity:\n  language: typescript\n").unwrap();
        assert_eq!(config.entity.language, Language::TypeScript);
    }

    #[test]
    fn test_validate() {
        let mut config = GeneratorConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.write_test_schema = true;
        config.validate().unwrap();

        config.entity.language = Language::Go;
        config.entity.package_name = " ".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.entity.package_name = "entity".into();
        config.entity.indent = String::new();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_yaml_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "entity: [").unwrap();
        let err = GeneratorConfig::from_yaml_file(&path).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"), "{err}");
    }

    #[test]
    fn test_json_schema_names_fields() {
        let schema = GeneratorConfig::json_schema().unwrap();
        assert!(schema.contains("include_dirs"));
        assert!(schema.contains("from_wueste"));
    }
}

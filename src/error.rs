//! Error types for wueste-gen

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Generator errors
#[derive(Error, Debug)]
pub enum Error {
    /// File not found, unreadable, or not valid JSON.
    #[error("Load error: {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Unsupported ref scheme or a ref that names no existing file.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Every structural problem found in one object schema.
    #[error("Structural errors in {context}:\n{}", errors.join("\n"))]
    Structural {
        context: String,
        errors: Vec<String>,
    },

    /// A backend met a type/format combination it cannot emit.
    #[error("Unsupported schema shape: {0}")]
    UnsupportedShape(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Load {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Messages carried by a structural error, empty for every other kind.
    pub fn structural_errors(&self) -> &[String] {
        match self {
            Error::Structural { errors, .. } => errors,
            _ => &[],
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_joins_messages() {
        let err = Error::Structural {
            context: "S".into(),
            errors: vec!["unknown type: foo".into(), "missing $id".into()],
        };
        assert_eq!(
            err.to_string(),
            "Structural errors in S:\nunknown type: foo\nmissing $id"
        );
        assert_eq!(err.structural_errors().len(), 2);
    }

    #[test]
    fn test_load_mentions_path() {
        let err = Error::load("/abs/x.json", "no such file");
        assert_eq!(err.to_string(), "Load error: /abs/x.json: no such file");
        assert!(err.structural_errors().is_empty());
    }
}

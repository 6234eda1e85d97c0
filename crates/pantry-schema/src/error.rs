//! # Error Types
//!
//! Loader and parser failures for the validation pipeline. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Errors carry the file's *base name*, never a full path, so diagnostic
//!   output is stable across environments.
//! - A schema failure is fatal for the whole run; a manifest failure is
//!   scoped to that single manifest when processing a batch.
//! - Structural validation failures are *not* errors — they are data
//!   (see [`crate::validate::Violation`]) and never short-circuit.

use std::path::Path;

use thiserror::Error;

/// A loader or parser failure that aborts validation of the current manifest.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// The schema file does not exist.
    #[error("{file}: schema file not found")]
    SchemaNotFound {
        /// Base name of the missing schema file.
        file: String,
    },

    /// The schema file exists but is not valid JSON Schema.
    #[error("{file}: {message}")]
    SchemaParse {
        /// Base name of the schema file.
        file: String,
        /// Underlying parser or compiler message.
        message: String,
    },

    /// The manifest file does not exist.
    #[error("{file}: manifest file not found")]
    ManifestNotFound {
        /// Base name of the missing manifest file.
        file: String,
    },

    /// The manifest file exists but could not be parsed.
    #[error("{file}: {message}")]
    ManifestParse {
        /// Base name of the manifest file.
        file: String,
        /// Underlying parser message.
        message: String,
    },
}

/// Extract the base name of a path for error reporting.
///
/// Full paths never appear in errors; they vary between machines and CI
/// runners and would make output impossible to diff.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_errors_render_base_name_only() {
        let err = ValidateError::SchemaParse {
            file: "schema.json".to_string(),
            message: "expected value at line 3 column 1".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("schema.json: "));
        assert!(!rendered.contains('/'));
    }

    #[test]
    fn test_not_found_messages_name_the_artifact() {
        let schema = ValidateError::SchemaNotFound {
            file: "schema.json".to_string(),
        };
        let manifest = ValidateError::ManifestNotFound {
            file: "app.json".to_string(),
        };
        assert_eq!(schema.to_string(), "schema.json: schema file not found");
        assert_eq!(manifest.to_string(), "app.json: manifest file not found");
    }

    #[test]
    fn test_base_name_strips_directories() {
        let path = PathBuf::from("/ci/work/bucket/app.yml");
        assert_eq!(base_name(&path), "app.yml");
    }
}

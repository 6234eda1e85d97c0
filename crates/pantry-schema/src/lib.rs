//! # pantry-schema — Manifest Schema Validation
//!
//! Validates package-manifest documents (JSON or YAML) against a JSON
//! Schema, producing human- or machine-readable diagnostics. Built as a
//! pre-commit/CI gate: manifests are edited by hand, and this crate
//! catches structural errors (missing fields, wrong types, pattern
//! mismatches) before publication.
//!
//! ## Pipeline
//!
//! Four stages, run in order per manifest:
//!
//! 1. [`schema::CompiledSchema`] — loads and compiles the schema once per
//!    validator instance.
//! 2. [`document::Document`] — normalizes a manifest into a canonical
//!    tree; YAML 1.1 boolean literals (`yes`/`no`/`on`/`off`/…) become
//!    booleans when written as plain scalars.
//! 3. [`validate::validate`] — structural validation, producing a tree of
//!    [`validate::Violation`]s (empty ⇒ valid); `anyOf`/`oneOf` branch
//!    failures nest under their composition error.
//! 4. [`report::Reporter`] — flattens the tree depth-first into ordered
//!    diagnostic strings, plain or CI-annotated.
//!
//! [`ManifestValidator`] ties the stages together for batch use.
//!
//! ## Crate Policy
//!
//! - Validation failures are data, never panics; loader failures are
//!   `Result`s. No `unwrap()` outside tests.
//! - The compiled schema is immutable after load and safe to share across
//!   threads; each validator owns its own diagnostic list.
//! - No network access: schema `$ref`s resolve locally or degrade to a
//!   permissive schema.

pub mod document;
pub mod error;
pub mod report;
pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

pub use document::{Document, Position};
pub use error::ValidateError;
pub use report::{OutputMode, Reporter};
pub use schema::CompiledSchema;
pub use validate::{Violation, ViolationKind};

/// Validates a batch of manifests against one schema.
///
/// The schema is loaded lazily on the first [`validate`](Self::validate)
/// call and cached; manifests are processed strictly sequentially, and the
/// diagnostic list is reset at the start of each run. A schema load
/// failure is fatal for every subsequent run; a manifest failure is scoped
/// to that one file.
pub struct ManifestValidator {
    schema_path: PathBuf,
    schema: Option<CompiledSchema>,
    reporter: Reporter,
}

impl ManifestValidator {
    /// Create a validator for the given schema path. Nothing is read
    /// until the first manifest is validated.
    pub fn new(schema_path: impl Into<PathBuf>, mode: OutputMode) -> Self {
        ManifestValidator {
            schema_path: schema_path.into(),
            schema: None,
            reporter: Reporter::new(mode),
        }
    }

    /// Validate one manifest. Returns `true` iff the manifest conforms.
    ///
    /// On `false`, [`diagnostics`](Self::diagnostics) holds either the
    /// formatted violation tree or a single loader/parser failure line.
    pub fn validate(&mut self, manifest_path: &Path) -> bool {
        self.reporter.clear();

        if self.schema.is_none() {
            match CompiledSchema::load(&self.schema_path) {
                Ok(schema) => self.schema = Some(schema),
                Err(e) => {
                    self.reporter.report_failure(&e);
                    return false;
                }
            }
        }
        let Some(schema) = self.schema.as_ref() else {
            return false;
        };

        let document = match Document::load(manifest_path) {
            Ok(document) => document,
            Err(e) => {
                self.reporter.report_failure(&e);
                return false;
            }
        };

        let violations = validate::validate(schema, &document);
        if violations.is_empty() {
            return true;
        }
        self.reporter.report(&violations, manifest_path);
        false
    }

    /// Diagnostics from the most recent run, in traversal order.
    pub fn diagnostics(&self) -> &[String] {
        self.reporter.diagnostics()
    }

    /// All diagnostics joined by newlines, for single-string consumers.
    pub fn error_summary(&self) -> String {
        self.diagnostics().join("\n")
    }
}

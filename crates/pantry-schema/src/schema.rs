//! # Schema Loading
//!
//! Reads a JSON Schema document from disk, parses it, and compiles a
//! [`jsonschema::Validator`]. The compiled schema is immutable and
//! `Send + Sync`; [`crate::ManifestValidator`] loads it lazily, at most
//! once, and reuses it for every manifest in a run.
//!
//! ## `$ref` Resolution
//!
//! A local retriever serves the root schema for its own `$id` (and for a
//! synthetic URI used when the schema has none), and answers any other URI
//! with a permissive empty schema. Validation therefore never touches the
//! network, and a schema with a dangling reference degrades instead of
//! failing the whole run.

use std::path::Path;

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;

use crate::error::{base_name, ValidateError};

/// URI the root schema is registered under when it declares no absolute `$id`.
const SYNTHETIC_ROOT_URI: &str = "json-schema://pantry/root";

/// Local retriever that resolves `$ref` URIs against the root schema.
///
/// Any URI that is not the root schema resolves to `{}` (accept anything),
/// which keeps the engine off the network.
#[derive(Debug, Clone)]
pub(crate) struct RootSchemaRetriever {
    uris: Vec<String>,
    schema: Value,
}

impl Retrieve for RootSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let without_fragment = uri_str.split('#').next().unwrap_or(uri_str);
        if self.uris.iter().any(|u| u == without_fragment) {
            return Ok(self.schema.clone());
        }
        Ok(serde_json::json!({}))
    }
}

/// A parsed and compiled JSON Schema, loaded once per validator instance.
///
/// The draft is auto-detected from the document's `$schema` declaration.
#[derive(Debug)]
pub struct CompiledSchema {
    file: String,
    id: String,
    root_uri: String,
    raw: Value,
    validator: Validator,
}

impl CompiledSchema {
    /// Load and compile a schema from a filesystem path.
    ///
    /// # Errors
    ///
    /// `SchemaNotFound` if the file is absent; `SchemaParse` if the
    /// content is not valid JSON or does not compile as a schema. Both
    /// carry the file's base name only.
    pub fn load(path: &Path) -> Result<Self, ValidateError> {
        let file = base_name(path);
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValidateError::SchemaNotFound { file });
            }
            Err(e) => {
                return Err(ValidateError::SchemaParse {
                    file,
                    message: e.to_string(),
                });
            }
        };

        let raw: Value = serde_json::from_str(&text).map_err(|e| ValidateError::SchemaParse {
            file: file.clone(),
            message: e.to_string(),
        })?;

        let declared_id = raw.get("$id").and_then(|v| v.as_str());
        let root_uri = match declared_id {
            Some(id) if id.contains("://") => id.to_string(),
            _ => SYNTHETIC_ROOT_URI.to_string(),
        };
        let mut uris = vec![root_uri.clone()];
        if let Some(id) = declared_id {
            if !uris.iter().any(|u| u == id) {
                uris.push(id.to_string());
            }
        }

        let mut opts = jsonschema::options();
        opts.with_retriever(RootSchemaRetriever {
            uris: uris.clone(),
            schema: raw.clone(),
        });
        let validator = opts.build(&raw).map_err(|e| ValidateError::SchemaParse {
            file: file.clone(),
            message: e.to_string(),
        })?;

        let id = declared_id
            .map(str::to_string)
            .unwrap_or_else(|| file.clone());

        Ok(CompiledSchema {
            file,
            id,
            root_uri,
            raw,
            validator,
        })
    }

    /// Base name of the schema file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The schema's `$id`, or its base file name when it declares none.
    /// Used as the schema identifier in diagnostics.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The parsed schema document.
    pub(crate) fn raw(&self) -> &Value {
        &self.raw
    }

    /// The compiled validator for the whole schema.
    pub(crate) fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Compile a validator for the sub-schema at `pointer` (a JSON Pointer
    /// into the root schema), used to re-validate a node against a single
    /// composition-keyword branch.
    ///
    /// Self-contained branches compile directly, which keeps the branch
    /// errors' schema paths relative to the branch. A branch whose internal
    /// `$ref`s need the rest of the document compiles through a `$ref` into
    /// the root instead, inheriting the root's `$schema` so the draft
    /// matches. Returns `None` when neither compiles — branch detail is
    /// best-effort enrichment, never load-bearing.
    pub(crate) fn branch_validator(&self, pointer: &str) -> Option<Validator> {
        if let Some(branch) = self.raw.pointer(pointer) {
            let mut opts = jsonschema::options();
            opts.with_retriever(RootSchemaRetriever {
                uris: vec![self.root_uri.clone(), self.id.clone()],
                schema: self.raw.clone(),
            });
            if let Ok(validator) = opts.build(branch) {
                return Some(validator);
            }
        }

        let mut wrapper = serde_json::Map::new();
        if let Some(meta) = self.raw.get("$schema") {
            wrapper.insert("$schema".to_string(), meta.clone());
        }
        wrapper.insert(
            "$ref".to_string(),
            Value::String(format!("{}#{}", self.root_uri, pointer)),
        );

        let mut opts = jsonschema::options();
        opts.with_retriever(RootSchemaRetriever {
            uris: vec![self.root_uri.clone(), self.id.clone()],
            schema: self.raw.clone(),
        });
        opts.build(&Value::Object(wrapper)).ok()
    }
}

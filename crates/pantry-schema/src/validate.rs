//! # Structural Validation
//!
//! Validates a normalized manifest document against a compiled schema and
//! shapes the engine's output into a tree of [`Violation`]s.
//!
//! Every violation is collected — validation never stops at the first
//! error. Violations are data, not errors: an empty top-level list is the
//! definition of a valid manifest.
//!
//! ## Composition keywords
//!
//! An `anyOf`/`oneOf` failure surfaces from the engine as a single opaque
//! error. To explain *why* each alternative failed, the offending node is
//! re-validated against every branch sub-schema in declaration order, and
//! each branch's failures become children of the composition error. A
//! violation with no children is an ordinary leaf. `allOf` branch failures
//! are already enumerated individually by the engine and stay flat.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde_json::Value;

use crate::document::Document;
use crate::schema::CompiledSchema;

/// Guard against `$ref` cycles when expanding nested composition branches.
const MAX_COMPOSITION_DEPTH: usize = 16;

/// Classification of a single schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Value has the wrong JSON type.
    Type,
    /// A required property is missing.
    Required,
    /// String does not match the schema's `pattern`.
    Pattern,
    /// Value is not one of the `enum` options.
    Enum,
    /// Value does not equal the `const`.
    Constant,
    /// String does not conform to a `format`.
    Format,
    /// No `anyOf` alternative accepted the value.
    AnyOf,
    /// `oneOf` matched zero branches, or more than one.
    OneOf,
    /// The value matched a `not` schema.
    Not,
    /// Object carries properties the schema does not allow.
    AdditionalProperties,
    /// Array carries more items than the tuple schema allows.
    AdditionalItems,
    /// No array item matched the `contains` schema.
    Contains,
    /// Array items are not unique.
    UniqueItems,
    /// A `propertyNames` schema rejected a key.
    PropertyNames,
    /// Numeric bound violations.
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    /// Length/count bound violations.
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    MinProperties,
    MaxProperties,
    /// Nothing validates against a `false` schema.
    FalseSchema,
    /// Any other engine-reported failure.
    Other,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            ViolationKind::Type => "type",
            ViolationKind::Required => "required",
            ViolationKind::Pattern => "pattern",
            ViolationKind::Enum => "enum",
            ViolationKind::Constant => "const",
            ViolationKind::Format => "format",
            ViolationKind::AnyOf => "anyOf",
            ViolationKind::OneOf => "oneOf",
            ViolationKind::Not => "not",
            ViolationKind::AdditionalProperties => "additionalProperties",
            ViolationKind::AdditionalItems => "additionalItems",
            ViolationKind::Contains => "contains",
            ViolationKind::UniqueItems => "uniqueItems",
            ViolationKind::PropertyNames => "propertyNames",
            ViolationKind::Minimum => "minimum",
            ViolationKind::Maximum => "maximum",
            ViolationKind::ExclusiveMinimum => "exclusiveMinimum",
            ViolationKind::ExclusiveMaximum => "exclusiveMaximum",
            ViolationKind::MultipleOf => "multipleOf",
            ViolationKind::MinLength => "minLength",
            ViolationKind::MaxLength => "maxLength",
            ViolationKind::MinItems => "minItems",
            ViolationKind::MaxItems => "maxItems",
            ViolationKind::MinProperties => "minProperties",
            ViolationKind::MaxProperties => "maxProperties",
            ViolationKind::FalseSchema => "false",
            ViolationKind::Other => "schema",
        };
        f.write_str(keyword)
    }
}

/// One schema violation with source context and nested branch failures.
///
/// Forms a tree: children are the per-branch failures of a composition
/// keyword, in schema-declaration order. Read-only once created; owned by
/// the validation result for the current manifest only.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Human-readable message from the schema engine.
    pub message: String,
    /// 1-based line in the original manifest where the node begins.
    pub line: usize,
    /// 1-based column in the original manifest where the node begins.
    pub column: usize,
    /// JSON Pointer to the offending node in the manifest.
    pub instance_path: String,
    /// JSON Pointer within the schema that rejected the node.
    pub schema_path: String,
    /// Identifier of the schema (`$id`, or its base file name).
    pub schema_id: String,
    /// Failure classification.
    pub kind: ViolationKind,
    /// Per-branch failures for composition keywords; empty for leaves.
    pub children: Vec<Violation>,
}

/// Validate a document against a schema, returning all top-level
/// violations (branch failures nested inside). Empty result ⇔ valid.
pub fn validate(schema: &CompiledSchema, document: &Document) -> Vec<Violation> {
    schema
        .validator()
        .iter_errors(document.root())
        .map(|err| build_violation(schema, document, "", "", &err, 0))
        .collect()
}

fn build_violation(
    schema: &CompiledSchema,
    document: &Document,
    instance_prefix: &str,
    schema_prefix: &str,
    err: &ValidationError<'_>,
    depth: usize,
) -> Violation {
    let instance_path = join_pointer(instance_prefix, &err.instance_path.to_string());
    // Anchor before recursing: a nested composition keyword inside a
    // branch must look itself up at its root-document location.
    let schema_path = anchor_pointer(schema_prefix, &err.schema_path.to_string());
    let position = document.position(&instance_path);
    let kind = classify(&err.kind);

    let children = if matches!(kind, ViolationKind::AnyOf | ViolationKind::OneOf) {
        branch_failures(schema, document, &instance_path, &schema_path, err, depth)
    } else {
        Vec::new()
    };

    Violation {
        message: err.to_string(),
        line: position.line,
        column: position.column,
        instance_path,
        schema_path,
        schema_id: schema.id().to_string(),
        kind,
        children,
    }
}

/// Re-validate the offending node against each branch of the composition
/// keyword at `keyword_pointer` (a root-anchored JSON Pointer), in
/// declaration order.
fn branch_failures(
    schema: &CompiledSchema,
    document: &Document,
    instance_path: &str,
    keyword_pointer: &str,
    err: &ValidationError<'_>,
    depth: usize,
) -> Vec<Violation> {
    if depth >= MAX_COMPOSITION_DEPTH {
        return Vec::new();
    }

    let Some(Value::Array(branches)) = schema.raw().pointer(keyword_pointer) else {
        // The keyword sits behind a `$ref` the raw document pointer cannot
        // follow; report the composition error as a leaf.
        return Vec::new();
    };

    let mut children = Vec::new();
    for index in 0..branches.len() {
        let branch_pointer = format!("{keyword_pointer}/{index}");
        let Some(branch) = schema.branch_validator(&branch_pointer) else {
            continue;
        };
        for branch_err in branch.iter_errors(err.instance.as_ref()) {
            children.push(build_violation(
                schema,
                document,
                instance_path,
                &branch_pointer,
                &branch_err,
                depth + 1,
            ));
        }
    }
    children
}

/// Join a parent instance pointer with a pointer relative to that node.
fn join_pointer(prefix: &str, relative: &str) -> String {
    if relative.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}{relative}")
    }
}

/// Anchor a schema pointer reported by a branch validator at the branch's
/// location in the root document. Directly compiled branches report paths
/// relative to the branch root; branches compiled through a `$ref` into
/// the root already carry the full path and pass through unchanged.
fn anchor_pointer(prefix: &str, relative: &str) -> String {
    if prefix.is_empty() || relative.starts_with(prefix) {
        relative.to_string()
    } else {
        format!("{prefix}{relative}")
    }
}

fn classify(kind: &ValidationErrorKind) -> ViolationKind {
    match kind {
        ValidationErrorKind::Type { .. } => ViolationKind::Type,
        ValidationErrorKind::Required { .. } => ViolationKind::Required,
        ValidationErrorKind::Pattern { .. } => ViolationKind::Pattern,
        ValidationErrorKind::Enum { .. } => ViolationKind::Enum,
        ValidationErrorKind::Constant { .. } => ViolationKind::Constant,
        ValidationErrorKind::Format { .. } => ViolationKind::Format,
        ValidationErrorKind::AnyOf { .. } => ViolationKind::AnyOf,
        ValidationErrorKind::OneOfNotValid { .. } => ViolationKind::OneOf,
        ValidationErrorKind::OneOfMultipleValid { .. } => ViolationKind::OneOf,
        ValidationErrorKind::Not { .. } => ViolationKind::Not,
        ValidationErrorKind::AdditionalProperties { .. } => ViolationKind::AdditionalProperties,
        ValidationErrorKind::AdditionalItems { .. } => ViolationKind::AdditionalItems,
        ValidationErrorKind::Contains { .. } => ViolationKind::Contains,
        ValidationErrorKind::UniqueItems { .. } => ViolationKind::UniqueItems,
        ValidationErrorKind::PropertyNames { .. } => ViolationKind::PropertyNames,
        ValidationErrorKind::Minimum { .. } => ViolationKind::Minimum,
        ValidationErrorKind::Maximum { .. } => ViolationKind::Maximum,
        ValidationErrorKind::ExclusiveMinimum { .. } => ViolationKind::ExclusiveMinimum,
        ValidationErrorKind::ExclusiveMaximum { .. } => ViolationKind::ExclusiveMaximum,
        ValidationErrorKind::MultipleOf { .. } => ViolationKind::MultipleOf,
        ValidationErrorKind::MinLength { .. } => ViolationKind::MinLength,
        ValidationErrorKind::MaxLength { .. } => ViolationKind::MaxLength,
        ValidationErrorKind::MinItems { .. } => ViolationKind::MinItems,
        ValidationErrorKind::MaxItems { .. } => ViolationKind::MaxItems,
        ValidationErrorKind::MinProperties { .. } => ViolationKind::MinProperties,
        ValidationErrorKind::MaxProperties { .. } => ViolationKind::MaxProperties,
        ValidationErrorKind::FalseSchema { .. } => ViolationKind::FalseSchema,
        _ => ViolationKind::Other,
    }
}

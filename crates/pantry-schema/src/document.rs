//! # Manifest Normalization
//!
//! Loads a manifest file (JSON or YAML, chosen by extension) into a single
//! canonical document tree: a [`serde_json::Value`] whose objects preserve
//! author key order, paired with a source map from JSON Pointer to the
//! 1-based line/column where each node begins in the original file.
//!
//! ## YAML handling
//!
//! YAML input is built directly in memory from marked parser events, never
//! through an intermediate serialization. Event-level parsing is what makes
//! two requirements possible at all:
//!
//! - **YAML 1.1 booleans.** A *plain* scalar matching the YAML 1.1 boolean
//!   set (<https://yaml.org/type/bool.html> — `y`/`yes`/`on`/`true` and
//!   friends, exact casing) resolves to a boolean, while the same text in
//!   quotes stays a string. Scalar style is invisible once a value tree has
//!   been built, so the distinction has to be made at event time.
//! - **Source positions.** Every event carries a marker, which becomes the
//!   line/column attached to validation diagnostics.
//!
//! JSON input is parsed with `serde_json` (authoritative value and error
//! message); the event builder runs over the same text purely to collect
//! node positions, JSON being a subset of YAML.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Number, Value};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::{base_name, ValidateError};

/// YAML 1.1 boolean literals that resolve to `true`. Exact, case-sensitive.
const YAML_BOOL_TRUE: [&str; 11] = [
    "y", "Y", "yes", "Yes", "YES", "true", "True", "TRUE", "on", "On", "ON",
];

/// YAML 1.1 boolean literals that resolve to `false`. Exact, case-sensitive.
const YAML_BOOL_FALSE: [&str; 11] = [
    "n", "N", "no", "No", "NO", "false", "False", "FALSE", "off", "Off", "OFF",
];

/// 1-based position of a node in the original manifest text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Position {
    /// Fallback when no position was recorded for a node.
    ///
    /// Positions are best-effort metadata; validity never depends on them.
    pub const FALLBACK: Position = Position { line: 1, column: 1 };

    fn from_marker(mark: Marker) -> Self {
        // Marker lines are 1-based, columns 0-based.
        Position {
            line: mark.line(),
            column: mark.col() + 1,
        }
    }
}

/// A normalized, format-agnostic manifest document.
///
/// Regardless of source format, semantically equal documents produce
/// structurally identical trees. The source map keys are JSON Pointers
/// (RFC 6901) into the tree.
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
    positions: HashMap<String, Position>,
}

impl Document {
    /// Load a manifest from disk, inferring the format from the extension:
    /// `.yml`/`.yaml` is YAML, anything else is JSON.
    ///
    /// # Errors
    ///
    /// `ManifestNotFound` if the file is absent, `ManifestParse` if the
    /// content is malformed. Both carry the file's base name only.
    pub fn load(path: &Path) -> Result<Self, ValidateError> {
        let file = base_name(path);
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValidateError::ManifestNotFound { file });
            }
            Err(e) => {
                return Err(ValidateError::ManifestParse {
                    file,
                    message: e.to_string(),
                });
            }
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml_str(&text, file),
            _ => Self::from_json_str(&text, file),
        }
    }

    /// Parse a JSON manifest from text.
    pub fn from_json_str(text: &str, file: String) -> Result<Self, ValidateError> {
        let root: Value =
            serde_json::from_str(text).map_err(|e| ValidateError::ManifestParse {
                file,
                message: e.to_string(),
            })?;

        // Position pass. JSON is valid YAML, so the event builder yields a
        // marker for every node; if the pass fails the map stays partial
        // and lookups fall back to 1:1.
        let mut builder = TreeBuilder::new(ScalarMode::Json);
        let mut parser = Parser::new(text.chars());
        let _ = parser.load(&mut builder, false);

        Ok(Document {
            root,
            positions: builder.positions,
        })
    }

    /// Parse a YAML manifest from text into the canonical tree.
    pub fn from_yaml_str(text: &str, file: String) -> Result<Self, ValidateError> {
        let mut builder = TreeBuilder::new(ScalarMode::Yaml11);
        let mut parser = Parser::new(text.chars());
        parser
            .load(&mut builder, false)
            .map_err(|e| ValidateError::ManifestParse {
                file: file.clone(),
                message: e.to_string(),
            })?;

        if let Some(message) = builder.error {
            return Err(ValidateError::ManifestParse { file, message });
        }

        Ok(Document {
            root: builder.root.unwrap_or(Value::Null),
            positions: builder.positions,
        })
    }

    /// The canonical document tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Position of the node at `pointer` (a JSON Pointer, `""` for the
    /// root), falling back to the root position and then to `1:1`.
    pub fn position(&self, pointer: &str) -> Position {
        self.positions
            .get(pointer)
            .or_else(|| self.positions.get(""))
            .copied()
            .unwrap_or(Position::FALLBACK)
    }
}

/// Escape a key for use as a JSON Pointer token (RFC 6901 §3).
pub(crate) fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// How plain scalars are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarMode {
    /// YAML 1.1 boolean set, then core-schema inference.
    Yaml11,
    /// JSON literals only (`true`/`false`/`null`/numbers).
    Json,
}

/// An open container on the build stack.
enum Frame {
    Sequence {
        items: Vec<Value>,
        /// Anchor id, 0 when unanchored.
        aid: usize,
        /// Key in the parent mapping, if any.
        slot: Option<String>,
    },
    Mapping {
        entries: Map<String, Value>,
        /// Key seen but whose value has not arrived yet.
        pending_key: Option<String>,
        aid: usize,
        slot: Option<String>,
    },
}

/// Event receiver that builds the canonical tree and source map in one pass.
struct TreeBuilder {
    mode: ScalarMode,
    stack: Vec<Frame>,
    /// Escaped pointer tokens of the open containers (root excluded).
    path: Vec<String>,
    positions: HashMap<String, Position>,
    anchors: HashMap<usize, Value>,
    root: Option<Value>,
    /// First structural problem; once set, remaining events are ignored.
    error: Option<String>,
}

impl TreeBuilder {
    fn new(mode: ScalarMode) -> Self {
        TreeBuilder {
            mode,
            stack: Vec::new(),
            path: Vec::new(),
            positions: HashMap::new(),
            anchors: HashMap::new(),
            root: None,
            error: None,
        }
    }

    /// Pointer to the innermost open container.
    fn container_pointer(&self) -> String {
        if self.path.is_empty() {
            String::new()
        } else {
            format!("/{}", self.path.join("/"))
        }
    }

    fn resolve_scalar(&self, text: String, style: TScalarStyle, tag: Option<Tag>) -> Value {
        // Quoted and block scalars are always strings.
        if !matches!(style, TScalarStyle::Plain) {
            return Value::String(text);
        }

        if let Some(tag) = tag {
            if tag.handle == "tag:yaml.org,2002:" || tag.handle == "!!" {
                return match tag.suffix.as_str() {
                    "str" => Value::String(text),
                    "null" => Value::Null,
                    "bool" => match yaml11_bool(&text) {
                        Some(b) => Value::Bool(b),
                        None => Value::String(text),
                    },
                    "int" => match text.parse::<i64>() {
                        Ok(i) => Value::Number(i.into()),
                        Err(_) => Value::String(text),
                    },
                    "float" => match text.parse::<f64>().ok().and_then(Number::from_f64) {
                        Some(n) => Value::Number(n),
                        None => Value::String(text),
                    },
                    _ => Value::String(text),
                };
            }
            // Application-specific tag; keep the literal text.
            return Value::String(text);
        }

        match self.mode {
            ScalarMode::Yaml11 => resolve_plain_yaml(text),
            ScalarMode::Json => resolve_plain_json(text),
        }
    }

    /// Insert a finished value into the innermost container (or as root),
    /// recording its source position.
    fn push_value(&mut self, value: Value, mark: Marker, aid: usize) {
        if aid != 0 {
            self.anchors.insert(aid, value.clone());
        }
        let base = self.container_pointer();
        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.positions.insert(String::new(), Position::from_marker(mark));
                    self.root = Some(value);
                }
            }
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => match pending_key.take() {
                Some(key) => {
                    let pointer = format!("{base}/{}", escape_pointer_token(&key));
                    self.positions.insert(pointer, Position::from_marker(mark));
                    entries.insert(key, value);
                }
                None => {
                    // A resolved value in key position (only aliases end up
                    // here); mappings accept string keys only.
                    match value {
                        Value::String(s) => *pending_key = Some(s),
                        other => {
                            self.error = Some(format!(
                                "unsupported mapping key: {other}"
                            ));
                        }
                    }
                }
            },
            Some(Frame::Sequence { items, .. }) => {
                let pointer = format!("{base}/{}", items.len());
                self.positions.insert(pointer, Position::from_marker(mark));
                items.push(value);
            }
        }
    }

    /// Open a container, recording its position and pointer token.
    fn begin_container(&mut self, mapping: bool, aid: usize, mark: Marker) {
        let base = self.container_pointer();
        let slot = match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    // Second document in the stream; first one wins.
                    None
                } else {
                    self.positions.insert(String::new(), Position::from_marker(mark));
                    None
                }
            }
            Some(Frame::Mapping { pending_key, .. }) => match pending_key.take() {
                Some(key) => {
                    let token = escape_pointer_token(&key);
                    let pointer = format!("{base}/{token}");
                    self.positions.insert(pointer, Position::from_marker(mark));
                    self.path.push(token);
                    Some(key)
                }
                None => {
                    self.error = Some("unsupported non-scalar mapping key".to_string());
                    return;
                }
            },
            Some(Frame::Sequence { items, .. }) => {
                let token = items.len().to_string();
                let pointer = format!("{base}/{token}");
                self.positions.insert(pointer, Position::from_marker(mark));
                self.path.push(token.clone());
                Some(token)
            }
        };

        if mapping {
            self.stack.push(Frame::Mapping {
                entries: Map::new(),
                pending_key: None,
                aid,
                slot,
            });
        } else {
            self.stack.push(Frame::Sequence {
                items: Vec::new(),
                aid,
                slot,
            });
        }
    }

    /// Close the innermost container and insert it into its parent.
    fn end_container(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let (value, aid, slot) = match frame {
            Frame::Sequence { items, aid, slot } => (Value::Array(items), aid, slot),
            Frame::Mapping {
                entries, aid, slot, ..
            } => (Value::Object(entries), aid, slot),
        };
        if aid != 0 {
            self.anchors.insert(aid, value.clone());
        }
        if slot.is_some() {
            self.path.pop();
        }
        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some(value);
                }
            }
            Some(Frame::Mapping { entries, .. }) => {
                if let Some(key) = slot {
                    entries.insert(key, value);
                }
            }
            Some(Frame::Sequence { items, .. }) => {
                items.push(value);
            }
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Scalar(text, style, aid, tag) => {
                // A scalar in key position stays raw text; quoting and
                // type inference apply to values only.
                let key_position = matches!(
                    self.stack.last(),
                    Some(Frame::Mapping {
                        pending_key: None,
                        ..
                    })
                );
                if key_position {
                    if let Some(Frame::Mapping { pending_key, .. }) = self.stack.last_mut() {
                        *pending_key = Some(text);
                    }
                } else {
                    let value = self.resolve_scalar(text, style, tag);
                    self.push_value(value, mark, aid);
                }
            }
            Event::SequenceStart(aid, _) => self.begin_container(false, aid, mark),
            Event::MappingStart(aid, _) => self.begin_container(true, aid, mark),
            Event::SequenceEnd | Event::MappingEnd => self.end_container(),
            Event::Alias(aid) => match self.anchors.get(&aid).cloned() {
                Some(value) => self.push_value(value, mark, 0),
                None => {
                    self.error = Some("alias references an unknown anchor".to_string());
                }
            },
            _ => {}
        }
    }
}

/// Match a plain scalar against the YAML 1.1 boolean literal set.
fn yaml11_bool(text: &str) -> Option<bool> {
    if YAML_BOOL_TRUE.contains(&text) {
        Some(true)
    } else if YAML_BOOL_FALSE.contains(&text) {
        Some(false)
    } else {
        None
    }
}

/// Type a plain YAML scalar: YAML 1.1 booleans first, then null, integer,
/// float, and finally string.
fn resolve_plain_yaml(text: String) -> Value {
    if let Some(b) = yaml11_bool(&text) {
        return Value::Bool(b);
    }
    if matches!(text.as_str(), "" | "~" | "null" | "Null" | "NULL") {
        return Value::Null;
    }
    resolve_number(text)
}

/// Type a plain scalar under JSON rules.
fn resolve_plain_json(text: String) -> Value {
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    resolve_number(text)
}

fn resolve_number(text: String) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = text.parse::<u64>() {
        return Value::Number(u.into());
    }
    // Float parsing is gated on a numeric-looking first character so that
    // words `f64::from_str` accepts ("inf", "NaN") stay strings.
    let numeric_start = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.');
    if numeric_start {
        if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(text)
}

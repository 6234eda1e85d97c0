//! # Diagnostic Reporting
//!
//! Flattens a violation tree into an ordered list of formatted diagnostic
//! strings. Two renderings: plain (human-readable, for local runs) and
//! CI-annotated (log-friendly markers for build output).
//!
//! The output mode is an explicit constructor argument; the library never
//! reads the environment. Deriving the mode from `CI` is the calling
//! layer's job.

use std::path::Path;

use crate::error::ValidateError;
use crate::validate::Violation;

/// Rendering style for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable blocks separated by blank lines.
    #[default]
    Plain,
    /// Machine/log-friendly `[*]`-annotated lines, no blank separators.
    Ci,
}

/// Accumulates formatted diagnostics for one validation run.
///
/// Traversal is depth-first pre-order: a parent's diagnostic always
/// precedes all of its descendants'. The list is cleared at the start of
/// each run and owned by that run only.
#[derive(Debug, Clone)]
pub struct Reporter {
    mode: OutputMode,
    diagnostics: Vec<String>,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Reporter {
            mode,
            diagnostics: Vec::new(),
        }
    }

    /// Drop all accumulated diagnostics. Called at the start of each run.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Formatted diagnostics, in traversal order.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Flatten a violation tree into diagnostics, depth-first pre-order,
    /// roots at depth 1.
    pub fn report(&mut self, violations: &[Violation], manifest_path: &Path) {
        for violation in violations {
            self.render(violation, 1, manifest_path);
        }
    }

    /// Record a loader/parser failure as a single diagnostic. Tree
    /// traversal is skipped entirely when the schema or manifest failed to
    /// load; this is the only output for such a run.
    pub fn report_failure(&mut self, err: &ValidateError) {
        let prefix = match self.mode {
            OutputMode::Plain => "",
            OutputMode::Ci => "    [*] ",
        };
        self.diagnostics.push(format!("{prefix}{err}"));
    }

    fn render(&mut self, violation: &Violation, depth: usize, manifest_path: &Path) {
        self.diagnostics
            .push(self.format_block(violation, depth, manifest_path));
        for child in &violation.children {
            self.render(child, depth + 1, manifest_path);
        }
    }

    /// One diagnostic block: Error, Line, and Path lines, indented two
    /// spaces per depth level.
    fn format_block(&self, violation: &Violation, depth: usize, manifest_path: &Path) -> String {
        let indent = "  ".repeat(depth);
        let location = format!(
            "{}:{}:{}",
            manifest_path.display(),
            violation.line,
            violation.column
        );
        let schema_location = format!("{}/{}", violation.schema_id, violation.kind);

        match self.mode {
            OutputMode::Plain => format!(
                "{indent}- Error: {}\n{indent}  Line: {location}\n{indent}  Path: {schema_location}\n",
                violation.message
            ),
            OutputMode::Ci => format!(
                "{indent}[*] Error: {}\n{indent}  [^] Line: {location}\n{indent}  [^] Path: {schema_location}",
                violation.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ViolationKind;

    fn violation(message: &str, children: Vec<Violation>) -> Violation {
        Violation {
            message: message.to_string(),
            line: 3,
            column: 5,
            instance_path: "/version".to_string(),
            schema_path: "/properties/version/type".to_string(),
            schema_id: "schema.json".to_string(),
            kind: ViolationKind::Type,
            children,
        }
    }

    #[test]
    fn test_plain_block_layout() {
        let mut reporter = Reporter::new(OutputMode::Plain);
        reporter.report(&[violation("wrong type", Vec::new())], Path::new("app.json"));
        assert_eq!(
            reporter.diagnostics(),
            ["  - Error: wrong type\n    Line: app.json:3:5\n    Path: schema.json/type\n"]
        );
    }

    #[test]
    fn test_ci_block_layout() {
        let mut reporter = Reporter::new(OutputMode::Ci);
        reporter.report(&[violation("wrong type", Vec::new())], Path::new("app.json"));
        assert_eq!(
            reporter.diagnostics(),
            ["  [*] Error: wrong type\n    [^] Line: app.json:3:5\n    [^] Path: schema.json/type"]
        );
    }

    #[test]
    fn test_depth_first_preorder_with_indentation() {
        let tree = vec![violation(
            "parent",
            vec![
                violation("child one", vec![violation("grandchild", Vec::new())]),
                violation("child two", Vec::new()),
            ],
        )];
        let mut reporter = Reporter::new(OutputMode::Ci);
        reporter.report(&tree, Path::new("app.json"));

        let messages: Vec<&str> = reporter
            .diagnostics()
            .iter()
            .map(|d| d.lines().next().unwrap())
            .collect();
        assert_eq!(
            messages,
            [
                "  [*] Error: parent",
                "    [*] Error: child one",
                "      [*] Error: grandchild",
                "    [*] Error: child two",
            ]
        );
    }

    #[test]
    fn test_clear_resets_between_runs() {
        let mut reporter = Reporter::new(OutputMode::Plain);
        reporter.report(&[violation("first run", Vec::new())], Path::new("a.json"));
        assert_eq!(reporter.diagnostics().len(), 1);
        reporter.clear();
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_failure_diagnostic_plain_and_ci() {
        let err = ValidateError::ManifestParse {
            file: "app.json".to_string(),
            message: "expected value at line 1 column 2".to_string(),
        };

        let mut plain = Reporter::new(OutputMode::Plain);
        plain.report_failure(&err);
        assert_eq!(
            plain.diagnostics(),
            ["app.json: expected value at line 1 column 2"]
        );

        let mut ci = Reporter::new(OutputMode::Ci);
        ci.report_failure(&err);
        assert_eq!(
            ci.diagnostics(),
            ["    [*] app.json: expected value at line 1 column 2"]
        );
    }
}

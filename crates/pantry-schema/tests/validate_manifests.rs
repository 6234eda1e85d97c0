//! Integration test: the full pipeline against the repository's
//! package-manifest schema, covering both source formats and both output
//! modes end to end.

use std::path::PathBuf;

use pantry_schema::{ManifestValidator, OutputMode};

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn schema_path() -> PathBuf {
    repo_root().join("schemas/manifest.schema.json")
}

#[test]
fn test_demo_manifests_validate() {
    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    for name in ["demos/vlc.json", "demos/ripgrep.yml"] {
        let path = repo_root().join(name);
        assert!(
            validator.validate(&path),
            "{name} should validate, got:\n{}",
            validator.error_summary()
        );
    }
}

#[test]
fn test_missing_version_fails_with_required() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.json");
    std::fs::write(&manifest, r#"{"description": "no version here"}"#).unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    assert!(!validator.validate(&manifest));
    assert_eq!(validator.diagnostics().len(), 1);
    let diagnostic = &validator.diagnostics()[0];
    assert!(diagnostic.contains("version"));
    assert!(diagnostic.contains("/required"));
}

#[test]
fn test_yaml11_boolean_accepted_where_schema_wants_boolean() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.yml");
    std::fs::write(&manifest, "version: 1.0.0\ninnosetup: yes\n").unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    assert!(
        validator.validate(&manifest),
        "plain `yes` must be a boolean, got:\n{}",
        validator.error_summary()
    );
}

#[test]
fn test_quoted_yaml_boolean_rejected_where_schema_wants_boolean() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.yml");
    std::fs::write(&manifest, "version: 1.0.0\ninnosetup: \"yes\"\n").unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    assert!(!validator.validate(&manifest));
    assert!(validator.error_summary().contains("/type"));
}

#[test]
fn test_json_and_yaml_manifests_agree() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("app.json");
    let yaml_path = dir.path().join("app.yml");
    std::fs::write(
        &json_path,
        r#"{"version": "2.1.0", "bin": ["a.exe", "b.exe"], "innosetup": true}"#,
    )
    .unwrap();
    std::fs::write(
        &yaml_path,
        "version: 2.1.0\nbin:\n  - a.exe\n  - b.exe\ninnosetup: on\n",
    )
    .unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    assert!(validator.validate(&json_path));
    assert!(validator.validate(&yaml_path));
}

#[test]
fn test_anyof_license_failure_reports_each_branch() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.json");
    // `license` is neither a string nor an object with `identifier`.
    std::fs::write(
        &manifest,
        r#"{"version": "1.0", "license": {"url": "https://example.org/license"}}"#,
    )
    .unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Ci);
    assert!(!validator.validate(&manifest));

    let diagnostics = validator.diagnostics();
    // One parent anyOf diagnostic followed by its branch failures, parent
    // first (depth-first pre-order).
    assert!(diagnostics.len() >= 3);
    assert!(diagnostics[0].contains("/anyOf"));
    assert!(diagnostics[0].starts_with("  [*] Error: "));
    for child in &diagnostics[1..] {
        assert!(child.starts_with("    [*] Error: "));
    }
    // Branch 0 wants a string; branch 1 wants `identifier`.
    let rest = diagnostics[1..].join("\n");
    assert!(rest.contains("/type"));
    assert!(rest.contains("/required"));
    assert!(rest.contains("identifier"));
}

#[test]
fn test_unknown_top_level_property_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.json");
    std::fs::write(&manifest, r#"{"version": "1.0", "autoupdate_typo": {}}"#).unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    assert!(!validator.validate(&manifest));
    assert!(validator.error_summary().contains("additionalProperties"));
}

#[test]
fn test_diagnostic_line_points_into_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.yml");
    std::fs::write(&manifest, "version: 1.0.0\ndescription: fine\ninnosetup: maybe\n")
        .unwrap();

    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Plain);
    assert!(!validator.validate(&manifest));
    let summary = validator.error_summary();
    // `maybe` sits on line 3, column 12.
    assert!(
        summary.contains(":3:12"),
        "expected a 3:12 source position, got:\n{summary}"
    );
}

#[test]
fn test_repeated_runs_are_idempotent() {
    let mut validator = ManifestValidator::new(schema_path(), OutputMode::Ci);
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.json");
    std::fs::write(&manifest, r#"{"description": "missing version"}"#).unwrap();

    assert!(!validator.validate(&manifest));
    let first: Vec<String> = validator.diagnostics().to_vec();
    assert!(!validator.validate(&manifest));
    assert_eq!(validator.diagnostics(), first.as_slice());
}

//! # pantry CLI Entry Point
//!
//! Thin glue around `pantry-schema`: argument parsing, glob expansion,
//! console printing, and process exit status. Everything with actual
//! design lives in the library.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pantry_schema::{ManifestValidator, OutputMode};

/// Validate package manifests against a JSON Schema.
///
/// Manifests may be JSON or YAML (chosen by extension); arguments
/// containing `*` or `?` are expanded as glob patterns.
#[derive(Parser, Debug)]
#[command(name = "pantry", version, about)]
struct Cli {
    /// JSON Schema file to validate against.
    schema: PathBuf,

    /// Manifest files or glob patterns.
    #[arg(required = true)]
    manifests: Vec<String>,

    /// Emit CI-annotated output (also enabled by CI=true in the environment).
    #[arg(long)]
    ci: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(all_valid) => {
            if all_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    // The library takes the mode as explicit configuration; deriving it
    // from the environment happens only here.
    let ci = cli.ci || ci_environment();
    let mode = if ci { OutputMode::Ci } else { OutputMode::Plain };

    let manifests = expand_manifests(&cli.manifests)?;
    tracing::debug!(count = manifests.len(), "validating manifests");

    let mut validator = ManifestValidator::new(&cli.schema, mode);
    let mut all_valid = true;

    for manifest in &manifests {
        let name = base_name(manifest);
        if validator.validate(manifest) {
            let prefix = if ci { "      [+]" } else { "-" };
            println!("{prefix} {name} validates against the schema!");
        } else {
            all_valid = false;
            let prefix = if ci { "      [-]" } else { "-" };
            let count = validator.diagnostics().len();
            let plural = if count == 1 { "" } else { "s" };
            println!("{prefix} {name} has {count} Error{plural}");
            for diagnostic in validator.diagnostics() {
                println!("{diagnostic}");
            }
        }
    }

    Ok(all_valid)
}

/// True when the `CI` environment variable is set to `true` (any casing).
fn ci_environment() -> bool {
    std::env::var("CI")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Expand manifest arguments: literal paths pass through, patterns
/// containing `*` or `?` go through glob expansion. Matches are sorted so
/// batch output is deterministic.
fn expand_manifests(args: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    for arg in args {
        if arg.contains('*') || arg.contains('?') {
            let matches = glob::glob(arg)
                .with_context(|| format!("invalid glob pattern: {arg}"))?;
            let mut expanded: Vec<PathBuf> = matches
                .collect::<Result<_, _>>()
                .with_context(|| format!("cannot read glob match for: {arg}"))?;
            expanded.sort();
            manifests.extend(expanded);
        } else {
            manifests.push(PathBuf::from(arg));
        }
    }
    Ok(manifests)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_arguments_pass_through() {
        let manifests = expand_manifests(&["bucket/app.json".to_string()]).unwrap();
        assert_eq!(manifests, [PathBuf::from("bucket/app.json")]);
    }

    #[test]
    fn test_glob_arguments_expand_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("ignored.yml"), "").unwrap();

        let pattern = format!("{}/*.json", dir.path().display());
        let manifests = expand_manifests(&[pattern]).unwrap();
        assert_eq!(
            manifests,
            [dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        // Unclosed character class; contains a wildcard so it is treated
        // as a pattern rather than a literal path.
        assert!(expand_manifests(&["[*".to_string()]).is_err());
    }
}

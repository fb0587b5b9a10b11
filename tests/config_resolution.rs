//! Config resolution integration tests
//!
//! End-to-end: project directory on disk -> ResolvedConfig -> compiled entry.

use std::fs;
use std::path::Path;

use bunfig::{compile, compile_file, ConfigError, ConfigFormat, ResolveOptions, ResolvedConfig};
use tempfile::TempDir;

const ENTRY: &str = "console.log(caterpillar);";
const EXPECTED: &str = "console.log('butterfly');";

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn resolve_in(dir: &Path) -> ResolvedConfig {
    ResolvedConfig::resolve(&ResolveOptions::new(dir)).unwrap()
}

#[test]
fn test_bun_json_define_rewrites_entry() {
    let dir = project(&[
        ("bun.json", r#"{"define": { "caterpillar": "'butterfly'" }}"#),
        ("index.ts", ENTRY),
    ]);

    let config = resolve_in(dir.path());
    let unit = compile_file(&dir.path().join("index.ts"), &config).unwrap();
    assert_eq!(unit.code, EXPECTED);
    assert_eq!(unit.replaced, 1);
}

#[test]
fn test_bunfig_toml_matches_bun_json() {
    let json = project(&[("bun.json", r#"{"define": { "caterpillar": "'butterfly'" }}"#)]);
    let toml = project(&[("bunfig.toml", "[define]\n\"caterpillar\" = \"'butterfly'\"\n")]);

    let from_json = resolve_in(json.path());
    let from_toml = resolve_in(toml.path());
    assert_eq!(from_json.defines(), from_toml.defines());
    assert_eq!(from_toml.source().unwrap().format, ConfigFormat::Toml);
    assert_eq!(compile(ENTRY, &from_toml).unwrap().code, EXPECTED);
}

#[test]
fn test_bun_json_wins_even_if_bunfig_toml_is_malformed() {
    let dir = project(&[
        ("bun.json", r#"{"define": { "caterpillar": "'butterfly'" }}"#),
        ("bunfig.toml", "[define\nthis is = not toml"),
    ]);

    let config = resolve_in(dir.path());
    assert_eq!(config.source().unwrap().path, dir.path().join("bun.json"));
    assert_eq!(compile(ENTRY, &config).unwrap().code, EXPECTED);
}

#[test]
fn test_explicit_toml_config_overrides_discovery() {
    let dir = project(&[
        ("bun.json", r#"{"define": { "caterpillar": "'moth'" }}"#),
        ("bun2.toml", "[define]\n\"caterpillar\" = \"'butterfly'\"\n"),
        ("index.ts", ENTRY),
    ]);

    let options = ResolveOptions::new(dir.path()).with_config_path("bun2.toml");
    let config = ResolvedConfig::resolve(&options).unwrap();
    assert_eq!(config.source().unwrap().path, dir.path().join("bun2.toml"));

    let unit = compile_file(&dir.path().join("index.ts"), &config).unwrap();
    assert_eq!(unit.code, EXPECTED);
}

#[test]
fn test_explicit_missing_config_is_fatal() {
    let dir = project(&[("bun.json", r#"{"define": {}}"#)]);

    let options = ResolveOptions::new(dir.path()).with_config_path("bun2.toml");
    let err = ResolvedConfig::resolve(&options).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(err.to_string().contains("bun2.toml"));
}

#[test]
fn test_malformed_default_config_is_fatal() {
    let dir = project(&[("bun.json", r#"{"define": "#)]);

    let err = ResolvedConfig::resolve(&ResolveOptions::new(dir.path())).unwrap_err();
    assert_eq!(err.kind(), "PARSE_ERROR");
    assert!(err.to_string().contains("bun.json"));
}

#[test]
fn test_non_string_define_is_schema_error() {
    let dir = project(&[("bunfig.toml", "[define]\nDEBUG = true\n")]);

    let err = ResolvedConfig::resolve(&ResolveOptions::new(dir.path())).unwrap_err();
    assert_eq!(err.kind(), "SCHEMA_ERROR");
    assert!(err.to_string().contains("bunfig.toml"));
}

#[test]
fn test_no_config_leaves_source_untouched() {
    let dir = project(&[]);

    let config = resolve_in(dir.path());
    assert!(config.source().is_none());
    assert_eq!(compile(ENTRY, &config).unwrap().code, ENTRY);
}

#[test]
fn test_resolution_is_idempotent() {
    let dir = project(&[(
        "bun.json",
        r#"{"define": { "caterpillar": "'butterfly'", "process.env.NODE_ENV": "\"production\"" }}"#,
    )]);

    let first = resolve_in(dir.path());
    let second = resolve_in(dir.path());
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_dotted_define_and_shadowing() {
    let dir = project(&[(
        "bun.json",
        r#"{"define": { "caterpillar": "'butterfly'", "process.env.NODE_ENV": "\"production\"" }}"#,
    )]);
    let config = resolve_in(dir.path());

    let source = "\
if (process.env.NODE_ENV !== 'production') log(caterpillar);
function f(caterpillar) { return caterpillar; }
const o = { caterpillar: caterpillar };
";
    let expected = "\
if (\"production\" !== 'production') log('butterfly');
function f(caterpillar) { return caterpillar; }
const o = { caterpillar: 'butterfly' };
";
    assert_eq!(compile(source, &config).unwrap().code, expected);
}

#[test]
fn test_cli_define_layers_over_config() {
    let dir = project(&[("bun.json", r#"{"define": { "caterpillar": "'moth'" }}"#)]);

    let options = ResolveOptions::new(dir.path()).with_define("caterpillar:'butterfly'");
    let config = ResolvedConfig::resolve(&options).unwrap();
    assert_eq!(compile(ENTRY, &config).unwrap().code, EXPECTED);
}

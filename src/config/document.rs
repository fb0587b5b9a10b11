//! Config document parsing.
//!
//! JSON and TOML files are both parsed into a `serde_json::Value` tree so the
//! rest of resolution does not care which format a file was written in.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::error::ConfigError;

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Derive the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(ConfigFormat::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(ConfigFormat::Toml)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
        }
    }

    /// Parse document text in this format.
    pub fn parse(self, contents: &str) -> Result<Value, String> {
        match self {
            ConfigFormat::Json => parse_json(contents),
            ConfigFormat::Toml => parse_toml(contents),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed config file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    /// Parsed document tree.
    pub value: Value,
    /// SHA-256 digest of the raw file bytes.
    pub digest: String,
}

/// Read and parse the config file at `path`.
pub fn load_document(path: &Path, format: ConfigFormat) -> Result<ConfigDocument, ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("invalid UTF-8: {}", e),
    })?;

    let value = format.parse(&contents).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(path = %path.display(), %format, %digest, "parsed config document");
    Ok(ConfigDocument { value, digest })
}

fn parse_json(contents: &str) -> Result<Value, String> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| format!("JSON parse error: {}", e))?;
    if !value.is_object() {
        return Err("JSON parse error: top-level value must be an object".to_string());
    }
    Ok(value)
}

fn parse_toml(contents: &str) -> Result<Value, String> {
    let table: toml::Table =
        toml::from_str(contents).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok(toml_to_json(toml::Value::Table(table)))
}

/// Convert a TOML value into the JSON document tree.
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("bun.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("dir/bun2.TOML")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("bunfig.yaml")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("bunfig")), None);
    }

    #[test]
    fn test_json_and_toml_give_same_tree() {
        let from_json = ConfigFormat::Json
            .parse(r#"{"define": { "caterpillar": "'butterfly'" }}"#)
            .unwrap();
        let from_toml = ConfigFormat::Toml
            .parse("[define]\n\"caterpillar\" = \"'butterfly'\"")
            .unwrap();
        assert_eq!(from_json, from_toml);
        assert_eq!(from_json, json!({"define": {"caterpillar": "'butterfly'"}}));
    }

    #[test]
    fn test_toml_scalars_converted() {
        let value = ConfigFormat::Toml
            .parse("n = 3\nf = 1.5\nb = true\nd = 1979-05-27\nlist = [1, 2]")
            .unwrap();
        assert_eq!(value["n"], 3);
        assert_eq!(value["f"], 1.5);
        assert_eq!(value["b"], true);
        assert_eq!(value["d"], "1979-05-27");
        assert_eq!(value["list"], json!([1, 2]));
    }

    #[test]
    fn test_json_top_level_must_be_object() {
        let err = ConfigFormat::Json.parse("[1, 2]").unwrap_err();
        assert!(err.contains("object"));
    }

    #[test]
    fn test_malformed_input() {
        assert!(ConfigFormat::Json
            .parse("{\"define\": ")
            .unwrap_err()
            .starts_with("JSON parse error"));
        assert!(ConfigFormat::Toml
            .parse("[define\ncaterpillar = ")
            .unwrap_err()
            .starts_with("TOML parse error"));
    }

    #[test]
    fn test_load_document_records_digest() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{\"define\": {{}}}}").unwrap();

        let doc = load_document(temp.path(), ConfigFormat::Json).unwrap();
        assert_eq!(doc.value, json!({"define": {}}));
        assert_eq!(doc.digest.len(), 64);

        let again = load_document(temp.path(), ConfigFormat::Json).unwrap();
        assert_eq!(doc.digest, again.digest);
    }

    #[test]
    fn test_load_document_parse_error_carries_path() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "not = [valid").unwrap();

        match load_document(temp.path(), ConfigFormat::Toml) {
            Err(ConfigError::Parse { path, message }) => {
                assert_eq!(path, temp.path());
                assert!(message.contains("TOML"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_document_invalid_utf8() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&[0xff, 0xfe, 0x00]).unwrap();

        let err = load_document(temp.path(), ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_load_document_missing_file_is_io_error() {
        let path = PathBuf::from("/nonexistent/dir/bun.json");
        let err = load_document(&path, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

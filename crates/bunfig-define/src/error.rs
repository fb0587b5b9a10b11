//! Error types for define extraction and source scanning.

use thiserror::Error;

/// The `define` table of a config document does not have the expected shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// `define` exists but is not a table/object.
    #[error("`define` must be a table of strings, found {found}")]
    NotATable { found: &'static str },

    /// A define value is not a string.
    #[error("value for define `{key}` must be a string, found {found}")]
    NonStringValue { key: String, found: &'static str },

    /// A define key is not an identifier or a dotted identifier chain.
    #[error("invalid define key `{0}`: expected an identifier like `FOO` or `process.env.FOO`")]
    InvalidKey(String),

    /// A define value is empty or whitespace only.
    #[error("define `{0}` has an empty replacement expression")]
    EmptyExpression(String),
}

impl SchemaError {
    /// Machine-readable code, stable across releases.
    pub fn to_code(&self) -> &'static str {
        match self {
            SchemaError::NotATable { .. } => "DEFINE_NOT_A_TABLE",
            SchemaError::NonStringValue { .. } => "DEFINE_NON_STRING_VALUE",
            SchemaError::InvalidKey(_) => "DEFINE_INVALID_KEY",
            SchemaError::EmptyExpression(_) => "DEFINE_EMPTY_EXPRESSION",
        }
    }
}

/// Source text could not be split into tokens.
///
/// Offsets are byte offsets into the scanned source.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),

    #[error("unterminated template literal starting at byte {0}")]
    UnterminatedTemplate(usize),

    #[error("unterminated block comment starting at byte {0}")]
    UnterminatedComment(usize),

    #[error("unterminated regular expression starting at byte {0}")]
    UnterminatedRegex(usize),
}

/// Describe a JSON value's type for error messages.
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_error_codes() {
        assert_eq!(
            SchemaError::InvalidKey("1abc".to_string()).to_code(),
            "DEFINE_INVALID_KEY"
        );
        assert_eq!(
            SchemaError::NotATable { found: "an array" }.to_code(),
            "DEFINE_NOT_A_TABLE"
        );
    }

    #[test]
    fn test_messages_name_the_key() {
        let err = SchemaError::NonStringValue {
            key: "caterpillar".to_string(),
            found: kind_of(&json!(42)),
        };
        let msg = err.to_string();
        assert!(msg.contains("caterpillar"));
        assert!(msg.contains("a number"));
    }

    #[test]
    fn test_scan_error_offset_in_message() {
        assert!(ScanError::UnterminatedString(17).to_string().contains("17"));
    }
}

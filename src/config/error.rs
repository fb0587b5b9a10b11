//! Config resolution errors.

use std::io;
use std::path::PathBuf;

use bunfig_define::SchemaError;

/// Fatal config resolution errors. Any of these aborts the run before
/// compilation starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicit config path was given but nothing exists there.
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// An explicit config path has an extension other than `.json`/`.toml`.
    #[error("unsupported config file {}: expected a .json or .toml file", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON/TOML.
    #[error("failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The `define` table does not have the expected shape.
    #[error("invalid define table in {}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// A `--define` flag could not be parsed.
    #[error("invalid --define `{value}`: {reason}")]
    DefineFlag { value: String, reason: String },
}

impl ConfigError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::NotFound { .. } => "CONFIG_NOT_FOUND",
            ConfigError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            ConfigError::Io { .. } => "IO_ERROR",
            ConfigError::Parse { .. } => "PARSE_ERROR",
            ConfigError::Schema { .. } => "SCHEMA_ERROR",
            ConfigError::DefineFlag { .. } => "INVALID_DEFINE_FLAG",
        }
    }
}

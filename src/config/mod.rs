//! Config resolution
//!
//! Finds the authoritative config file for a run, parses it as JSON or TOML,
//! and extracts its `define` table into a [`ResolvedConfig`]:
//! 1. Explicit `--config` path, if given
//! 2. `bun.json` in the working directory
//! 3. `bunfig.toml` in the working directory

mod document;
mod error;
mod locate;
mod resolved;

pub use document::{load_document, ConfigDocument, ConfigFormat};
pub use error::ConfigError;
pub use locate::{locate, ConfigCandidate, DEFAULT_CONFIG_FILES};
pub use resolved::{
    parse_define_flag, ConfigSource, DefineOrigin, ResolveOptions, ResolvedConfig,
};

//! bunfig - config resolution and compile-time defines
//!
//! Locates a `bun.json` or `bunfig.toml` (or an explicit `--config` file),
//! extracts its `define` table, and substitutes the configured expressions for
//! free identifiers when compiling a program.

pub mod compile;
pub mod config;
pub mod logging;

pub use bunfig_define::{DefineMap, RawExpr, ScanError, SchemaError};
pub use compile::{compile, compile_file, CompileError, CompiledUnit};
pub use config::{ConfigError, ConfigFormat, ConfigSource, ResolveOptions, ResolvedConfig};

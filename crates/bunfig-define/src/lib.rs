//! Define tables and compile-time identifier substitution.
//!
//! A define maps an identifier (or a dotted chain such as
//! `process.env.NODE_ENV`) to raw replacement source text. This crate
//! extracts define tables from parsed config documents and applies them to
//! JavaScript/TypeScript source. It does no filesystem IO.

mod define;
mod error;
mod scanner;
mod substitute;

pub use define::{extract_defines, validate_key, DefineMap, RawExpr, DEFINE_KEY};
pub use error::{ScanError, SchemaError};
pub use scanner::{scan, Token, TokenKind};
pub use substitute::{substitute, Substitution};

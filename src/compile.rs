//! Compile stage
//!
//! Applies the resolved defines to a single compilation unit. The resolved
//! config is passed in explicitly; there is no process-wide config.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bunfig_define::{substitute, ScanError};

use crate::config::ResolvedConfig;

/// A compiled unit with defines substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Source path, when compiled from a file
    pub path: Option<PathBuf>,
    /// Rewritten source
    pub code: String,
    /// Number of references replaced
    pub replaced: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compile {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: ScanError,
    },
}

/// Substitute the config's defines into `source`.
pub fn compile(source: &str, config: &ResolvedConfig) -> Result<CompiledUnit, ScanError> {
    if config.defines().is_empty() {
        return Ok(CompiledUnit {
            path: None,
            code: source.to_string(),
            replaced: 0,
        });
    }

    let result = substitute(source, config.defines())?;
    Ok(CompiledUnit {
        path: None,
        code: result.code,
        replaced: result.replaced,
    })
}

/// Read `path` and compile it.
pub fn compile_file(path: &Path, config: &ResolvedConfig) -> Result<CompiledUnit, CompileError> {
    let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut unit = compile(&source, config).map_err(|source| CompileError::Scan {
        path: path.to_path_buf(),
        source,
    })?;
    unit.path = Some(path.to_path_buf());

    tracing::debug!(path = %path.display(), replaced = unit.replaced, "compiled unit");
    Ok(unit)
}

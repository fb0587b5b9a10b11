//! Resolved config with provenance
//!
//! The resolved config is built once per run from the working directory, the
//! optional explicit config path, and any `--define` flags. It is immutable
//! afterwards and handed to the compiler explicitly.
//!
//! Define layers, lowest precedence first:
//! 1. The `define` table of the authoritative config file
//! 2. `--define KEY:VALUE` flags

use std::collections::BTreeMap;
use std::path::PathBuf;

use bunfig_define::{extract_defines, DefineMap, RawExpr};
use serde::Serialize;

use super::document::{load_document, ConfigFormat};
use super::error::ConfigError;
use super::locate::locate;

/// The config file a resolution used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub format: ConfigFormat,
    /// SHA-256 digest of the raw file bytes
    pub digest: String,
}

/// Which layer supplied a define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefineOrigin {
    Config,
    Cli,
}

/// Inputs to config resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Directory searched for default config files
    pub cwd: PathBuf,
    /// Explicit config path; disables default discovery
    pub config_path: Option<PathBuf>,
    /// Raw `KEY:VALUE` define flags, in command-line order
    pub cli_defines: Vec<String>,
}

impl ResolveOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Default::default()
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_define(mut self, flag: impl Into<String>) -> Self {
        self.cli_defines.push(flag.into());
        self
    }
}

/// Run-scoped config consumed by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    source: Option<ConfigSource>,
    defines: DefineMap,
    origins: BTreeMap<String, DefineOrigin>,
}

impl ResolvedConfig {
    /// A config with no source and no defines.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Locate, parse and extract defines, then apply CLI define flags.
    pub fn resolve(options: &ResolveOptions) -> Result<Self, ConfigError> {
        let candidate = locate(&options.cwd, options.config_path.as_deref())?;

        let (source, mut defines) = match candidate {
            Some(candidate) => {
                let document = load_document(&candidate.path, candidate.format)?;
                let defines =
                    extract_defines(&document.value).map_err(|source| ConfigError::Schema {
                        path: candidate.path.clone(),
                        source,
                    })?;
                let source = ConfigSource {
                    path: candidate.path,
                    format: candidate.format,
                    digest: document.digest,
                };
                (Some(source), defines)
            }
            None => {
                tracing::debug!(cwd = %options.cwd.display(), "no config file found");
                (None, DefineMap::new())
            }
        };

        let mut origins: BTreeMap<String, DefineOrigin> = defines
            .keys()
            .map(|key| (key.to_string(), DefineOrigin::Config))
            .collect();

        let mut cli = DefineMap::new();
        for flag in &options.cli_defines {
            let (key, expr) = parse_define_flag(flag)?;
            cli.insert(key.as_str(), expr)
                .map_err(|e| ConfigError::DefineFlag {
                    value: flag.clone(),
                    reason: e.to_string(),
                })?;
            origins.insert(key, DefineOrigin::Cli);
        }
        for key in defines.overlay(cli) {
            tracing::debug!(key = %key, "--define overrides config file define");
        }

        tracing::info!(
            source = source.as_ref().map(|s| s.path.display().to_string()).as_deref().unwrap_or("none"),
            defines = defines.len(),
            "resolved config"
        );

        Ok(Self {
            source,
            defines,
            origins,
        })
    }

    /// The config file used, if any.
    pub fn source(&self) -> Option<&ConfigSource> {
        self.source.as_ref()
    }

    pub fn defines(&self) -> &DefineMap {
        &self.defines
    }

    pub fn origin(&self, key: &str) -> Option<DefineOrigin> {
        self.origins.get(key).copied()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        match &self.source {
            Some(source) => {
                out.push_str(&format!(
                    "Config: {} ({})\n",
                    source.path.display(),
                    source.format
                ));
                out.push_str(&format!("  Digest: {}\n", source.digest));
            }
            None => out.push_str("Config: none\n"),
        }

        if self.defines.is_empty() {
            out.push_str("Defines: none\n");
        } else {
            out.push_str(&format!("Defines ({}):\n", self.defines.len()));
            for (key, expr) in self.defines.iter() {
                let origin = match self.origin(key) {
                    Some(DefineOrigin::Cli) => " [--define]",
                    _ => "",
                };
                out.push_str(&format!("  {} = {}{}\n", key, expr, origin));
            }
        }
        out
    }
}

/// Parse a `KEY:VALUE` define flag. The value is kept verbatim, including any
/// further `:` characters.
pub fn parse_define_flag(flag: &str) -> Result<(String, RawExpr), ConfigError> {
    match flag.split_once(':') {
        Some((key, value)) => Ok((key.to_string(), RawExpr::new(value))),
        None => Err(ConfigError::DefineFlag {
            value: flag.to_string(),
            reason: "expected KEY:VALUE".to_string(),
        }),
    }
}

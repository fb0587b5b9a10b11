//! Config file discovery.
//!
//! Exactly one config source is authoritative per run:
//! 1. An explicit path (`--config` / `-c`), if given.
//! 2. Otherwise the first default file that exists in the working
//!    directory: `bun.json`, then `bunfig.toml`.
//! 3. Otherwise none.

use std::path::{Path, PathBuf};

use super::document::ConfigFormat;
use super::error::ConfigError;

/// Default config files, in probe order.
pub const DEFAULT_CONFIG_FILES: &[(&str, ConfigFormat)] = &[
    ("bun.json", ConfigFormat::Json),
    ("bunfig.toml", ConfigFormat::Toml),
];

/// A config file location and the format it will be parsed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCandidate {
    pub path: PathBuf,
    pub format: ConfigFormat,
}

/// Find the authoritative config file.
///
/// A relative `explicit` path is resolved against `cwd`. Returns `Ok(None)`
/// when no explicit path is given and no default file exists.
pub fn locate(cwd: &Path, explicit: Option<&Path>) -> Result<Option<ConfigCandidate>, ConfigError> {
    if let Some(explicit) = explicit {
        let path = cwd.join(explicit);
        let format = ConfigFormat::from_path(&path)
            .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.clone() })?;
        if !path.is_file() {
            return Err(ConfigError::NotFound { path });
        }
        tracing::debug!(path = %path.display(), %format, "using explicit config file");
        return Ok(Some(ConfigCandidate { path, format }));
    }

    for (name, format) in DEFAULT_CONFIG_FILES {
        let path = cwd.join(name);
        tracing::debug!(path = %path.display(), "probing for config file");
        if path.is_file() {
            return Ok(Some(ConfigCandidate {
                path,
                format: *format,
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_no_config() {
        let dir = tempdir().unwrap();
        assert_eq!(locate(dir.path(), None).unwrap(), None);
    }

    #[test]
    fn test_finds_bun_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bun.json"), "{}").unwrap();

        let candidate = locate(dir.path(), None).unwrap().unwrap();
        assert_eq!(candidate.path, dir.path().join("bun.json"));
        assert_eq!(candidate.format, ConfigFormat::Json);
    }

    #[test]
    fn test_finds_bunfig_toml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bunfig.toml"), "").unwrap();

        let candidate = locate(dir.path(), None).unwrap().unwrap();
        assert_eq!(candidate.path, dir.path().join("bunfig.toml"));
        assert_eq!(candidate.format, ConfigFormat::Toml);
    }

    #[test]
    fn test_bun_json_wins_over_bunfig_toml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bun.json"), "{}").unwrap();
        fs::write(dir.path().join("bunfig.toml"), "not [valid").unwrap();

        let candidate = locate(dir.path(), None).unwrap().unwrap();
        assert_eq!(candidate.path, dir.path().join("bun.json"));
    }

    #[test]
    fn test_directory_named_like_default_is_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("bun.json")).unwrap();
        fs::write(dir.path().join("bunfig.toml"), "").unwrap();

        let candidate = locate(dir.path(), None).unwrap().unwrap();
        assert_eq!(candidate.format, ConfigFormat::Toml);
    }

    #[test]
    fn test_explicit_path_overrides_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bun.json"), "{}").unwrap();
        fs::write(dir.path().join("bun2.toml"), "").unwrap();

        let candidate = locate(dir.path(), Some(Path::new("bun2.toml")))
            .unwrap()
            .unwrap();
        assert_eq!(candidate.path, dir.path().join("bun2.toml"));
        assert_eq!(candidate.format, ConfigFormat::Toml);
    }

    #[test]
    fn test_explicit_absolute_path() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let path = other.path().join("custom.json");
        fs::write(&path, "{}").unwrap();

        let candidate = locate(dir.path(), Some(&path)).unwrap().unwrap();
        assert_eq!(candidate.path, path);
    }

    #[test]
    fn test_explicit_missing_is_not_found() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bun.json"), "{}").unwrap();

        let err = locate(dir.path(), Some(Path::new("missing.json"))).unwrap_err();
        match err {
            ConfigError::NotFound { path } => assert_eq!(path, dir.path().join("missing.json")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_unknown_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bunfig.yaml"), "").unwrap();

        let err = locate(dir.path(), Some(Path::new("bunfig.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }
}

//! Diagnostic logging setup for the `bunfig` binary.
//!
//! Logs go to stderr so stdout stays reserved for command output.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter used when neither `--log-level`, `--verbose` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive. Precedence: `--log-level`, then `--verbose`,
/// then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn filter_directive(verbose: bool, level: Option<&str>, env: Option<&str>) -> String {
    if let Some(level) = level {
        return level.to_string();
    }
    if verbose {
        return "debug".to_string();
    }
    match env {
        Some(env) if !env.trim().is_empty() => env.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber.
pub fn init(verbose: bool, level: Option<&str>) -> Result<(), String> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(verbose, level, env.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| format!("invalid log filter `{}`: {}", directive, e))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_warn() {
        assert_eq!(filter_directive(false, None, None), "warn");
        assert_eq!(filter_directive(false, None, Some("  ")), "warn");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(filter_directive(false, None, Some("info")), "info");
        assert_eq!(filter_directive(true, None, Some("info")), "debug");
        assert_eq!(filter_directive(true, Some("trace"), Some("info")), "trace");
    }
}

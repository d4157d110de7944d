//! Logging setup.
//!
//! Diagnostics go to stderr so stdout stays clean for command output.
//! `RUST_LOG` overrides the level derived from `-v`/`-q`.

use tracing_subscriber::EnvFilter;

fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> anyhow::Result<()> {
    let level = default_level(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("maven_itf={level},itf={level},{level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))
}

/// Subscriber for tests: output captured per test, safe to call repeatedly.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_flags() {
        assert_eq!(default_level(0, false), "warn");
        assert_eq!(default_level(1, false), "info");
        assert_eq!(default_level(2, false), "debug");
        assert_eq!(default_level(5, false), "trace");
        assert_eq!(default_level(3, true), "error");
    }

    #[test]
    fn test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::debug!("still alive");
    }
}

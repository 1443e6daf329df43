//! Logging bootstrap for the binaries.
//!
//! Library modules only emit through the `log` facade; a binary calls
//! [`init_logging`] once at startup. Repeated calls are harmless and never
//! panic (tests and the server may both try to initialise).

use anyhow::{anyhow, Result};
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::str::FromStr;

/// Initialise the global logger at `level` (`RUST_LOG` still wins when set).
///
/// Fails on an unknown level. A logger that is already installed is left
/// in place.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = LevelFilter::from_str(level.trim())
        .map_err(|_| anyhow!("unsupported log level `{}`", level))?;

    let env = Env::default().default_filter_or(filter.as_str());

    match Builder::from_env(env).format_timestamp_secs().try_init() {
        Ok(()) => {
            log::debug!("logging initialised at {}", filter);
            Ok(())
        }
        // Another logger is already active; keep it
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_logging("debug").is_ok());
        assert!(init_logging("info").is_ok());
    }

    #[test]
    fn test_rejects_unknown_level() {
        let err = init_logging("chatty").unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }
}

//! Production configuration validation
//!
//! Security checks for production deployments.

use super::config::AppConfig;
use anyhow::{bail, Result};
use tracing::warn;

/// Validate configuration for production security
pub fn validate_production_config(config: &AppConfig) -> Result<()> {
    if config.terminal.shell.trim().is_empty() {
        bail!("terminal.shell must not be empty");
    }
    if config.terminal.read_chunk_bytes == 0 || config.terminal.output_buffer == 0 {
        bail!("terminal.read_chunk_bytes and terminal.output_buffer must be positive");
    }

    let is_production = std::env::var("NEXTMONTH_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);

    if !is_production {
        return Ok(());
    }

    if config.server.host == "0.0.0.0" {
        warn!(
            "SECURITY WARNING: Server is binding to all interfaces (0.0.0.0) in production. \
             Every client that can reach it gets an interactive shell."
        );
    }

    if config.terminal.cwd.is_none() && config.server.host != "127.0.0.1" {
        warn!(
            "SECURITY WARNING: terminal.cwd is not set while the server is exposed externally. \
             Shells start in the server's own working directory."
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_production_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_shell_is_rejected() {
        let mut config = AppConfig::default();
        config.terminal.shell = "  ".to_string();
        assert!(validate_production_config(&config).is_err());
    }
}

//! Server configuration types
//!
//! Contains all configuration structures for the NextMonth server.

use anyhow::{Context, Result};
use nextmonth_core::{RegistryConfig, ShellConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
}

impl AppConfig {
    /// Directory holding the database and logs
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(nextmonth_store::default_data_dir)
    }

    /// SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir().join("nextmonth.db"))
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path (defaults to `<data_dir>/nextmonth.db`)
    #[serde(default)]
    pub path: Option<String>,
}

/// Interactive terminal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Shell program
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Shell arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// `TERM` exported to the shell
    #[serde(default = "default_term")]
    pub term: String,
    /// Working directory for shells (defaults to the server's)
    #[serde(default)]
    pub cwd: Option<String>,
    /// Buffered output events per session
    #[serde(default = "default_output_buffer")]
    pub output_buffer: usize,
    /// Maximum bytes per pipe read
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
    /// Wait for pipes to drain after a shell exits
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Remove never-attached sessions after this many seconds (0 = never)
    #[serde(default = "default_unattached_ttl_secs")]
    pub unattached_ttl_secs: u64,
    /// How often the expiry sweep runs
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            args: Vec::new(),
            term: default_term(),
            cwd: None,
            output_buffer: default_output_buffer(),
            read_chunk_bytes: default_read_chunk_bytes(),
            drain_timeout_ms: default_drain_timeout_ms(),
            unattached_ttl_secs: default_unattached_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl TerminalConfig {
    /// Shell launcher settings
    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            program: self.shell.clone(),
            args: self.args.clone(),
            term: self.term.clone(),
            output_buffer: self.output_buffer,
            read_chunk_bytes: self.read_chunk_bytes,
            drain_timeout: Duration::from_millis(self.drain_timeout_ms),
        }
    }

    /// Registry settings (working directory and environment)
    pub fn registry_config(&self) -> Result<RegistryConfig> {
        match &self.cwd {
            Some(cwd) => Ok(RegistryConfig {
                cwd: PathBuf::from(cwd),
                env: Vec::new(),
            }),
            None => RegistryConfig::from_current_dir()
                .context("Failed to resolve terminal working directory"),
        }
    }

    /// Expiry for unattached sessions, if enabled
    pub fn unattached_ttl(&self) -> Option<Duration> {
        (self.unattached_ttl_secs > 0).then(|| Duration::from_secs(self.unattached_ttl_secs))
    }

    /// Interval between expiry sweeps
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn default_shell() -> String {
    nextmonth_core::process::DEFAULT_SHELL.to_string()
}

fn default_term() -> String {
    nextmonth_core::process::DEFAULT_TERM.to_string()
}

fn default_output_buffer() -> usize {
    256
}

fn default_read_chunk_bytes() -> usize {
    4096
}

fn default_drain_timeout_ms() -> u64 {
    500
}

fn default_unattached_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Project defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsConfig {
    /// Owner of projects created through the API (no authentication)
    #[serde(default = "default_user_id")]
    pub default_user_id: i64,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
        }
    }
}

fn default_user_id() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_defaults() {
        let config = TerminalConfig::default();
        let shell = config.shell_config();
        assert_eq!(shell.program, "bash");
        assert_eq!(shell.term, "xterm-color");
        assert_eq!(shell.drain_timeout, Duration::from_millis(500));
        assert_eq!(config.unattached_ttl(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_ttl_zero_disables_expiry() {
        let config = TerminalConfig {
            unattached_ttl_secs: 0,
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.unattached_ttl().is_none());
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_database_path_follows_data_dir() {
        let config = AppConfig {
            data_dir: Some("/tmp/nm".to_string()),
            ..Default::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/nm/nextmonth.db"));
    }

    #[test]
    fn test_configured_cwd() {
        let config = TerminalConfig {
            cwd: Some("/srv".to_string()),
            ..Default::default()
        };
        assert_eq!(config.registry_config().unwrap().cwd, PathBuf::from("/srv"));
    }
}

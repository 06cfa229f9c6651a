//! Configuration management for the calculator server.
//!
//! Settings come from built-in defaults, optionally replaced by a TOML file,
//! then overridden by command-line flags. The file is only ever read.

use crate::cli::Args;
use anyhow::Context;
use calc_server::config::{
    DEFAULT_BACKLOG, DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_SESSIONS, DEFAULT_POLL_INTERVAL_MS,
};
use calc_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration settings
    pub server: ServerSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Session limits and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Maximum number of concurrently active sessions
    pub max_sessions: usize,
    /// Idle timeout per session in seconds (0 disables it)
    pub connection_timeout: u64,
    /// Upper bound on the accept wait in milliseconds
    pub poll_interval_ms: u64,
    /// Listen backlog
    pub backlog: i32,
    /// Longest accepted request line in bytes
    pub max_line_length: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            connection_timeout: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backlog: DEFAULT_BACKLOG,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of file settings.
    pub fn apply_overrides(&mut self, args: &Args) {
        if let Some(max_sessions) = args.max_sessions {
            self.server.max_sessions = max_sessions;
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }

        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.max_sessions == 0 {
            return Err("max_sessions must be at least 1".to_string());
        }
        if u32::try_from(self.server.max_sessions).is_err() {
            return Err(format!(
                "max_sessions must not exceed {}, got {}",
                u32::MAX,
                self.server.max_sessions
            ));
        }
        if self.server.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }
        if self.server.backlog <= 0 {
            return Err("backlog must be greater than 0".to_string());
        }
        if self.server.max_line_length == 0 {
            return Err("max_line_length must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            ));
        }

        Ok(())
    }

    /// Builds the server configuration for `bind_address`.
    pub fn to_server_config(&self, bind_address: SocketAddr) -> ServerConfig {
        ServerConfig {
            bind_address,
            max_sessions: self.server.max_sessions,
            connection_timeout: self.server.connection_timeout,
            poll_interval_ms: self.server.poll_interval_ms,
            backlog: self.server.backlog,
            max_line_length: self.server.max_line_length,
        }
    }
}

//! Configuration management for the portal.
//!
//! The configuration lives in one TOML file. A missing file is created with
//! the defaults on first start; CLI flags override individual values after
//! loading.

use plugin_discord_webhook::DiscordSettings;
use portal_cron::RunnerConfig;
use portal_http::Account;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    #[serde(default)]
    pub plugins: PluginSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub cron: CronSettings,
    #[serde(default)]
    pub discord: DiscordSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address the HTTP listener binds to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Plugin whitelist - if non-empty, only these plugins will be loaded
    #[serde(default)]
    pub whitelist: Vec<String>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
    /// Optional file that receives a copy of every log line
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CronSettings {
    /// Directory scanned for job descriptor files
    pub jobs_directory: String,
    /// Descriptor extension, without the dot
    pub extension: String,
    /// Prefix shown before job names in the run output
    pub namespace: String,
    /// Directory the TempCleanup job prunes
    pub scratch_directory: String,
    /// Age in seconds after which TempCleanup deletes a file
    pub max_file_age_secs: u64,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            jobs_directory: "cron".to_string(),
            extension: "job".to_string(),
            namespace: "portal::cron".to_string(),
            scratch_directory: "tmp".to_string(),
            max_file_age_secs: 24 * 60 * 60,
        }
    }
}

impl CronSettings {
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            jobs_directory: PathBuf::from(&self.jobs_directory),
            extension: self.extension.clone(),
            namespace: self.namespace.clone(),
        }
    }

    pub fn max_file_age(&self) -> Duration {
        Duration::from_secs(self.max_file_age_secs)
    }
}

/// Accounts for the in-memory authenticator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_address: "127.0.0.1:8080".to_string(),
            },
            plugins: PluginSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
                file_path: None,
            },
            cron: CronSettings::default(),
            discord: DiscordSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Checks the configuration for values the portal cannot start with.
    pub fn validate(&self) -> Result<(), String> {
        if self
            .server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(format!(
                "Invalid bind address: {}",
                self.server.bind_address
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            ));
        }

        if self.cron.jobs_directory.is_empty() {
            return Err("Cron jobs directory cannot be empty".to_string());
        }
        if self.cron.extension.is_empty() || self.cron.extension.starts_with('.') {
            return Err(format!(
                "Invalid cron job extension: '{}' (expected e.g. \"job\")",
                self.cron.extension
            ));
        }

        for account in &self.auth.accounts {
            if account.login.trim().is_empty() {
                return Err("Auth accounts need a non-empty login".to_string());
            }
        }

        Ok(())
    }
}

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SECONDS_PER_DAY: i64 = 86_400;

/// Upper bound for session and subscription lifetimes, in days
const MAX_LIFETIME_DAYS: i64 = 3_650;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Lifetime of a session that did not ask to be remembered
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: i64,
    #[serde(default = "default_remember_days")]
    pub remember_days: i64,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default = "default_period_days")]
    pub period_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_seconds: default_session_ttl(),
            remember_days: default_remember_days(),
            cleanup_interval: default_cleanup_interval(),
            secure_cookie: false,
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://portal.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_cookie_name() -> String {
    "portal_session".to_string()
}

fn default_session_ttl() -> i64 {
    86_400 // 1 day
}

fn default_remember_days() -> i64 {
    365
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_period_days() -> u32 {
    30
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// `DATABASE_URL` wins over the file so deployments can relocate the store
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.override_database_url(url);
        }
    }

    fn override_database_url(&mut self, url: String) {
        if !url.trim().is_empty() {
            self.database.url = url;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.database.url.trim().is_empty() {
            bail!("database url must not be empty");
        }

        if self.database.max_connections == 0 {
            bail!("max_connections must be greater than 0");
        }

        // Cookie names end up verbatim in Set-Cookie headers
        let cookie_name = &self.session.cookie_name;
        if cookie_name.is_empty()
            || !cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!(
                "Invalid cookie_name '{}'. Use ASCII letters, digits, '_' or '-'",
                cookie_name
            );
        }

        if !(1..=MAX_LIFETIME_DAYS * SECONDS_PER_DAY).contains(&self.session.ttl_seconds) {
            bail!(
                "session ttl_seconds ({}) must be between 1 and {}",
                self.session.ttl_seconds,
                MAX_LIFETIME_DAYS * SECONDS_PER_DAY
            );
        }

        if !(1..=MAX_LIFETIME_DAYS).contains(&self.session.remember_days) {
            bail!(
                "session remember_days ({}) must be between 1 and {}",
                self.session.remember_days,
                MAX_LIFETIME_DAYS
            );
        }

        if self.session.cleanup_interval == 0 {
            bail!("session cleanup_interval must be greater than 0");
        }

        if !(1..=MAX_LIFETIME_DAYS).contains(&i64::from(self.subscription.period_days)) {
            bail!(
                "subscription period_days ({}) must be between 1 and {}",
                self.subscription.period_days,
                MAX_LIFETIME_DAYS
            );
        }

        if !(4..=31).contains(&self.security.bcrypt_cost) {
            bail!(
                "bcrypt_cost ({}) must be between 4 and 31",
                self.security.bcrypt_cost
            );
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }

    pub fn remember_seconds(&self) -> i64 {
        self.session.remember_days.saturating_mul(SECONDS_PER_DAY)
    }
}

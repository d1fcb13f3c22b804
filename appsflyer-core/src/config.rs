//! Configuration loading and management
//!
//! Two sources feed the tracker:
//! - `~/.config/appsflyer/config.toml` for transport tuning, logging and the
//!   location of the app registry
//! - the app registry itself, a JSON array of per-platform app credentials
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/appsflyer/` (~/.config/appsflyer/)
//! - State/Logs: `$XDG_STATE_HOME/appsflyer/` (~/.local/state/appsflyer/)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Production host for server-to-server in-app events
pub const DEFAULT_ENDPOINT: &str = "https://api2.appsflyer.com";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Mobile platform an app is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("unknown platform '{}' (expected android or ios)", other)),
        }
    }
}

/// Credentials for one app as registered with AppsFlyer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// App identifier used in the endpoint path (e.g. `id123456789`)
    pub app_id: String,
    /// Bundle / package name injected into every event
    pub bundle_id: String,
    /// Dev key sent verbatim in the `Authentication` header
    pub dev_key: String,
    pub platform: Platform,
}

/// Immutable platform -> app mapping
///
/// Built once from a registry file and never mutated afterwards; the tracker
/// replaces the whole registry instead of editing it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppRegistry {
    apps: HashMap<Platform, AppConfig>,
}

impl AppRegistry {
    /// Build a registry from app records. Later records replace earlier
    /// ones for the same platform.
    pub fn new(apps: impl IntoIterator<Item = AppConfig>) -> Self {
        let mut map = HashMap::new();
        for app in apps {
            map.insert(app.platform, app);
        }
        Self { apps: map }
    }

    /// Decode a JSON array of app records
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let apps: Vec<AppConfig> = serde_json::from_reader(reader)
            .map_err(|e| Error::Config(format!("failed to parse app registry: {}", e)))?;
        Ok(Self::new(apps))
    }

    /// Load the registry from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Config(format!("failed to open app registry {:?}: {}", path, e))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn get(&self, platform: Platform) -> Option<&AppConfig> {
        self.apps.get(&platform)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.apps.keys().copied()
    }
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Path to the JSON app registry
    #[serde(default)]
    pub apps_path: Option<PathBuf>,

    /// HTTP transport tuning
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP transport tuning for the tracker's connection pool
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Base URL; `/inappevent/{appId}` is appended per request
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// TCP keep-alive interval in seconds
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_secs: u64,

    /// Idle pooled connections kept per host
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    /// Seconds an idle pooled connection is kept open
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Overall per-request timeout. Unset means only the connect
    /// timeout bounds a request.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout(),
            tcp_keepalive_secs: default_tcp_keepalive(),
            max_idle_connections: default_max_idle_connections(),
            idle_timeout_secs: default_idle_timeout(),
            request_timeout_secs: None,
        }
    }
}

impl TransportConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config(
                "transport.endpoint must not be empty".to_string(),
            ));
        }
        if self.max_idle_connections == 0 {
            return Err(Error::Config(
                "transport.max_idle_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn tcp_keepalive(&self) -> Duration {
        Duration::from_secs(self.tcp_keepalive_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_tcp_keepalive() -> u64 {
    30
}

fn default_max_idle_connections() -> usize {
    10
}

fn default_idle_timeout() -> u64 {
    90
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Mirror log lines to stderr in addition to the log file
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            stderr: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.transport.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/appsflyer/config.toml` (~/.config/appsflyer/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("appsflyer").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/appsflyer/` (~/.local/state/appsflyer/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("appsflyer")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("appsflyer.log")
    }
}

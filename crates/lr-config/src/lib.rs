//! Configuration management for lr.
//!
//! Parses `lr.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `watch.root`
//! - `client.url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the watched directory.
    pub watch_root: Option<PathBuf>,
    /// Override the debounce delay.
    pub debounce_ms: Option<u64>,
    /// Override the WebSocket URL the listener connects to.
    pub client_url: Option<String>,
    /// Override the listener's reconnect delay.
    pub reconnect_delay_ms: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "lr.toml";

/// Upper bound for both delays; anything longer is almost certainly a typo.
const MAX_DELAY_MS: u64 = 60_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notifier endpoint configuration.
    pub server: ServerConfig,
    /// Watch configuration (root is a relative string from TOML).
    watch: WatchConfigRaw,
    /// Listener configuration.
    pub client: ClientConfig,

    /// Resolved watch configuration (set after loading).
    #[serde(skip)]
    pub watch_resolved: WatchConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Notifier endpoint configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw watch configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WatchConfigRaw {
    root: Option<String>,
    debounce_ms: Option<u64>,
}

/// Resolved watch configuration with an absolute root.
#[derive(Debug)]
pub struct WatchConfig {
    /// Directory watched recursively.
    pub root: PathBuf,
    /// Quiet period before a reload is broadcast.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src"),
            debounce_ms: 100,
        }
    }
}

impl WatchConfig {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit WebSocket URL. Derived from `[server]` when unset.
    pub url: Option<String>,
    /// Fixed delay between a disconnect and the next connection attempt.
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Reconnect delay as a [`Duration`].
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`client.url`").
        field: String,
        /// Error message (e.g., "${`LR_PORT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use the ws:// or wss:// scheme.
fn require_ws_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("ws://") && !url.starts_with("wss://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with ws:// or wss://"
        )));
    }
    Ok(())
}

/// Require a delay to be at most [`MAX_DELAY_MS`].
fn require_delay_in_range(value: u64, field: &str) -> Result<(), ConfigError> {
    if value > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "{field} cannot exceed {MAX_DELAY_MS}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `lr.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated again so overrides cannot bypass the file checks.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root) = &settings.watch_root {
            self.watch_resolved.root.clone_from(root);
        }
        if let Some(debounce_ms) = settings.debounce_ms {
            self.watch_resolved.debounce_ms = debounce_ms;
        }
        if let Some(url) = &settings.client_url {
            self.client.url = Some(url.clone());
        }
        if let Some(reconnect_delay_ms) = settings.reconnect_delay_ms {
            self.client.reconnect_delay_ms = reconnect_delay_ms;
        }
    }

    /// WebSocket URL the listener should connect to.
    ///
    /// Uses `client.url` when set. Otherwise builds `ws://host:port/` from the
    /// server section, replacing a wildcard bind address with loopback.
    #[must_use]
    pub fn client_url(&self) -> String {
        if let Some(url) = &self.client.url {
            return url.clone();
        }
        let host = match self.server.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
            other => other,
        };
        format!("ws://{host}:{}/", self.server.port)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let watch = WatchConfig::default();
        Self {
            server: ServerConfig::default(),
            watch: WatchConfigRaw::default(),
            client: ClientConfig::default(),
            watch_resolved: WatchConfig {
                root: base.join(watch.root),
                debounce_ms: watch.debounce_ms,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_watch()?;
        self.validate_client()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 asks the OS for a random port, which no listener could guess
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate watch configuration.
    fn validate_watch(&self) -> Result<(), ConfigError> {
        if self.watch_resolved.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "watch.root cannot be empty".to_owned(),
            ));
        }
        require_delay_in_range(self.watch_resolved.debounce_ms, "watch.debounce_ms")
    }

    /// Validate client configuration.
    fn validate_client(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.client.url {
            require_non_empty(url, "client.url")?;
            require_ws_url(url, "client.url")?;
        }

        // A zero delay would turn a down notifier into a busy loop
        if self.client.reconnect_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "client.reconnect_delay_ms must be greater than 0".to_owned(),
            ));
        }
        require_delay_in_range(self.client.reconnect_delay_ms, "client.reconnect_delay_ms")
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(root) = &self.watch.root {
            self.watch.root = Some(expand::expand_env(root, "watch.root")?);
        }

        if let Some(url) = &self.client.url {
            self.client.url = Some(expand::expand_env(url, "client.url")?);
        }

        Ok(())
    }

    /// Resolve the watch root against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = WatchConfig::default();
        let root = self
            .watch
            .root
            .as_deref()
            .map_or(defaults.root, PathBuf::from);

        self.watch_resolved = WatchConfig {
            root: config_dir.join(root),
            debounce_ms: self.watch.debounce_ms.unwrap_or(defaults.debounce_ms),
        };
    }
}

//! Live reload notifier for lr.
//!
//! Watches a directory tree and tells every connected client to reload when
//! something in it changes:
//! - Recursive filesystem watching via `notify`
//! - Debouncing of event bursts into a single notification
//! - WebSocket fan-out of the literal text `reload`
//! - An embedded browser listener script at `/livereload.js`
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use lr_server::{NotifierConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = NotifierConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 8080,
//!         watch_root: PathBuf::from("src"),
//!         debounce: Duration::from_millis(100),
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! notify thread ──paths──►┐
//!                         ├─► Hub task (ConnectionSet + debounce timer)
//! socket tasks ──connect/─┘        │
//!                disconnect        └─► "reload" ──► every open socket task ──► browser
//! ```

mod app;
mod client_script;
mod error;
mod live_reload;
mod state;

use std::path::PathBuf;
use std::time::Duration;

pub use error::NotifierError;
pub use live_reload::Notifier;

/// Notifier configuration.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on (0 lets the OS choose).
    pub port: u16,
    /// Directory watched recursively.
    pub watch_root: PathBuf,
    /// Quiet period after the last filesystem event before a reload is sent.
    pub debounce: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            watch_root: PathBuf::from("src"),
            debounce: Duration::from_millis(100),
        }
    }
}

/// Run a notifier until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the notifier fails to start or the signal handler
/// cannot be installed.
pub async fn run_server(config: NotifierConfig) -> Result<(), NotifierError> {
    let mut notifier = Notifier::new(config);
    notifier.start().await?;

    let signal = shutdown_signal().await;
    notifier.stop().await;

    signal.map_err(NotifierError::from)
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping notifier...");
    Ok(())
}

/// Create notifier configuration from lr config.
#[must_use]
pub fn notifier_config_from_lr_config(config: &lr_config::Config) -> NotifierConfig {
    NotifierConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        watch_root: config.watch_resolved.root.clone(),
        debounce: config.watch_resolved.debounce(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = NotifierConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.watch_root, PathBuf::from("src"));
        assert_eq!(config.debounce, Duration::from_millis(100));
    }

    #[test]
    fn test_notifier_config_from_lr_config() {
        let mut config = lr_config::Config::default();
        config.server.host = "0.0.0.0".to_owned();
        config.server.port = 9300;
        config.watch_resolved.root = PathBuf::from("/work/site");
        config.watch_resolved.debounce_ms = 250;

        let notifier = notifier_config_from_lr_config(&config);

        assert_eq!(notifier.host, "0.0.0.0");
        assert_eq!(notifier.port, 9300);
        assert_eq!(notifier.watch_root, PathBuf::from("/work/site"));
        assert_eq!(notifier.debounce, Duration::from_millis(250));
    }
}

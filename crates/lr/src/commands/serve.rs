//! `lr serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use lr_config::{CliSettings, Config};
use lr_server::{notifier_config_from_lr_config, run_server};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover lr.toml).
    #[arg(short, long, env = "LR_CONFIG")]
    config: Option<PathBuf>,

    /// Directory to watch (overrides config).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Quiet period in milliseconds before a reload is sent (overrides config).
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Enable verbose output (connections, reloads, HTTP requests).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the notifier fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            watch_root: self.root,
            debounce_ms: self.debounce_ms,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting live reload on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Watching: {}",
            config.watch_resolved.root.display()
        ));
        output.info(&format!("Debounce: {} ms", config.watch_resolved.debounce_ms));
        output.highlight(&format!(
            "Add to your page: <script src=\"http://{}:{}/livereload.js\"></script>",
            config.server.host, config.server.port
        ));

        run_server(notifier_config_from_lr_config(&config)).await?;

        Ok(())
    }
}

//! `lr listen` command implementation.

use std::path::PathBuf;

use clap::Args;
use lr_client::{Listener, ReloadAction, WsConnector};
use lr_config::{CliSettings, Config};
use tokio::process::Command;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the listen command.
#[derive(Args)]
pub(crate) struct ListenArgs {
    /// Path to configuration file (default: auto-discover lr.toml).
    #[arg(short, long, env = "LR_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket URL of the notifier (overrides config).
    #[arg(short, long)]
    url: Option<String>,

    /// Delay in milliseconds between reconnect attempts (overrides config).
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,

    /// Shell command to run on every reload.
    #[arg(short, long)]
    exec: Option<String>,

    /// Enable verbose output (connection state changes).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ListenArgs {
    /// Execute the listen command.
    ///
    /// Runs until Ctrl-C. Losing the notifier is not an error; the listener
    /// keeps retrying.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the signal handler
    /// cannot be installed.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if self.exec.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(CliError::Validation("--exec cannot be empty".to_owned()));
        }

        let cli_settings = CliSettings {
            client_url: self.url,
            reconnect_delay_ms: self.reconnect_delay_ms,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let url = config.client_url();

        output.info(&format!("Listening for reloads from {url}"));
        if let Some(command) = &self.exec {
            output.info(&format!("On reload: {command}"));
        }

        let action = ReloadCommand {
            command: self.exec,
            output,
        };
        let handle = Listener::new(WsConnector::new(url), action)
            .with_reconnect_delay(config.client.reconnect_delay())
            .spawn();

        let signal = tokio::signal::ctrl_c().await;
        handle.stop().await;
        signal?;

        Ok(())
    }
}

/// Reload action for the terminal: report, then optionally run a command.
struct ReloadCommand {
    command: Option<String>,
    output: Output,
}

impl ReloadAction for ReloadCommand {
    fn reload(&mut self) {
        self.output.highlight("Reload");

        let Some(command) = &self.command else {
            return;
        };

        let mut child = match shell(command).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "Failed to run reload command");
                return;
            }
        };

        // Reap in the background so a slow command never delays the next reload
        let command = command.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::warn!(command = %command, %status, "Reload command failed");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(command = %command, error = %e, "Failed to wait for reload command");
                }
            }
        });
    }
}

/// Build a command that runs `command` through the platform shell.
fn shell(command: &str) -> Command {
    let (program, flag) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    let mut cmd = Command::new(program);
    cmd.arg(flag).arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::ffi::OsStr;

    #[test]
    fn test_shell_wraps_command() {
        let cmd = shell("make css");
        let std_cmd = cmd.as_std();
        let args: Vec<&OsStr> = std_cmd.get_args().collect();

        if cfg!(windows) {
            assert_eq!(std_cmd.get_program(), "cmd");
            assert_eq!(args, [OsStr::new("/C"), OsStr::new("make css")]);
        } else {
            assert_eq!(std_cmd.get_program(), "sh");
            assert_eq!(args, [OsStr::new("-c"), OsStr::new("make css")]);
        }
    }

    #[tokio::test]
    async fn test_reload_without_command_only_reports() {
        let mut action = ReloadCommand {
            command: None,
            output: Output::new(),
        };
        action.reload();
    }
}

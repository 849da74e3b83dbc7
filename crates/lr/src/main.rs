//! lr CLI - Live reload for local development.
//!
//! Provides commands for:
//! - `serve`: Watch a directory and notify connected clients on change
//! - `listen`: Connect to a running notifier and react to reloads

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ListenArgs, ServeArgs};
use error::CliError;
use output::Output;

/// lr - Live reload for local development.
#[derive(Parser)]
#[command(name = "lr", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory and broadcast reloads to connected clients.
    Serve(ServeArgs),
    /// Connect to a notifier and react to reloads.
    Listen(ListenArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Serve(args) => args.verbose,
            Self::Listen(args) => args.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.command.verbose()))
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| {
            rt.block_on(async {
                match cli.command {
                    Commands::Serve(args) => args.execute().await,
                    Commands::Listen(args) => args.execute().await,
                }
            })
        });

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Log level used when `RUST_LOG` is unset and `--verbose` is not given.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Build the log filter.
///
/// `--verbose` enables INFO level, otherwise use `RUST_LOG` or default to WARN.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_verbose_filter_is_info() {
        assert_eq!(log_filter(true).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_default_filter_shows_warnings() {
        assert_eq!(
            EnvFilter::new(DEFAULT_LOG_LEVEL).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        // Without RUST_LOG the quiet filter still lets warnings through
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(log_filter(false).max_level_hint(), Some(LevelFilter::WARN));
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_verbose() {
        let cli = Cli::try_parse_from(["lr", "serve", "--root", "web", "-p", "9000", "-v"]).unwrap();
        assert!(cli.command.verbose());
    }

    #[test]
    fn test_parse_listen_with_exec() {
        let cli = Cli::try_parse_from([
            "lr",
            "listen",
            "--url",
            "ws://127.0.0.1:9000/",
            "--exec",
            "make",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Listen(_)));
        assert!(!cli.command.verbose());
    }
}

//! CLI error types.

use lr_config::ConfigError;
use lr_server::NotifierError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Notifier(#[from] NotifierError),

    #[error("{0}")]
    Validation(String),
}

//! Notifier error types.

use std::path::PathBuf;

/// Errors that prevent the notifier from starting or running.
///
/// Everything here is a startup failure. Clients dropping off is routine
/// and never surfaces as an error.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// Watch root is missing or not a directory.
    #[error("Watch root is not a directory: {}", .0.display())]
    WatchRoot(PathBuf),

    /// The filesystem watcher could not be created or attached.
    #[error("Failed to watch files: {0}")]
    Watch(#[from] notify::Error),

    /// The TCP endpoint could not be bound.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address that was requested.
        address: String,
        /// Underlying I/O error (e.g. address already in use).
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a notifier that is already running.
    #[error("Notifier is already running")]
    AlreadyStarted,

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Listener error types.

/// Failure to reach the notifier.
///
/// Never fatal to a [`Listener`](crate::Listener): it only means the next
/// attempt happens after the reconnect delay.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// TCP connect or WebSocket handshake failed.
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        /// URL that was dialled.
        url: String,
        /// Underlying transport error.
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
}

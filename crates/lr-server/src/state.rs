//! Application state.
//!
//! Shared state for all request handlers.

use tokio::sync::mpsc;

use crate::live_reload::HubEvent;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Channel into the live reload hub, used to register connections.
    pub(crate) hub: mpsc::Sender<HubEvent>,
}

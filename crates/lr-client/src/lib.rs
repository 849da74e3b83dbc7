//! Live reload listener for lr.
//!
//! Keeps a WebSocket connection to an lr notifier open and runs a
//! [`ReloadAction`] whenever the notifier sends `reload`. Connection loss is
//! never an error: the listener waits a fixed delay and tries again, forever,
//! until it is cancelled.
//!
//! # Quick Start
//!
//! ```ignore
//! use lr_client::{Listener, WsConnector};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = Listener::new(WsConnector::new("ws://127.0.0.1:8080/"), || {
//!         println!("reloading");
//!     });
//!     let handle = listener.spawn();
//!
//!     tokio::signal::ctrl_c().await.unwrap();
//!     handle.stop().await;
//! }
//! ```

mod action;
mod error;
mod listener;
mod state;
mod transport;

use std::time::Duration;

pub use action::ReloadAction;
pub use error::ClientError;
pub use listener::{Listener, ListenerHandle};
pub use state::ListenerState;
pub use transport::{Connector, MessageSource, WsConnection, WsConnector};

/// Payload that triggers a reload. Anything else is ignored.
pub const RELOAD_SIGNAL: &str = "reload";

/// Reconnect delay used unless [`Listener::with_reconnect_delay`] says otherwise.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

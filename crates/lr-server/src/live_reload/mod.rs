//! Live reload: file watching, debouncing and WebSocket fan-out.

mod connections;
mod debouncer;
mod hub;
mod manager;
mod websocket;

pub(crate) use hub::HubEvent;
pub use manager::Notifier;
pub(crate) use websocket::ws_handler;

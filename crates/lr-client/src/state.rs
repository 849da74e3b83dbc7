//! Listener connection state.

use std::fmt;

/// Where a listener is in its connect/reconnect cycle.
///
/// `Disconnected → Connecting → Connected → Disconnected → …`, with the fixed
/// reconnect delay spent in `Disconnected`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListenerState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        assert_eq!(ListenerState::default(), ListenerState::Disconnected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ListenerState::Connecting.to_string(), "connecting");
        assert_eq!(ListenerState::Connected.to_string(), "connected");
    }
}

//! Open client connections and reload fan-out.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

/// The one message clients act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReloadSignal;

impl ReloadSignal {
    /// Wire representation.
    pub const TEXT: &'static str = "reload";

    pub fn as_str(self) -> &'static str {
        Self::TEXT
    }
}

/// Bookkeeping identity of a connection. Never sent to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sending to a connection whose socket task has gone away.
#[derive(Debug, thiserror::Error)]
#[error("connection closed")]
pub(crate) struct ConnectionClosed;

/// A connection the hub can push reload signals to.
pub(crate) trait Connection {
    /// Whether the connection can still accept messages.
    fn is_open(&self) -> bool;

    /// Queue a signal without waiting for the client to read it.
    fn send(&self, signal: ReloadSignal) -> Result<(), ConnectionClosed>;
}

/// Hub-side handle to a WebSocket task.
///
/// Dropping the handle closes the outbound queue, which makes the socket task
/// close the WebSocket.
pub(crate) struct ClientHandle {
    outbound: mpsc::UnboundedSender<ReloadSignal>,
}

impl ClientHandle {
    pub fn new(outbound: mpsc::UnboundedSender<ReloadSignal>) -> Self {
        Self { outbound }
    }
}

impl Connection for ClientHandle {
    fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    fn send(&self, signal: ReloadSignal) -> Result<(), ConnectionClosed> {
        self.outbound.send(signal).map_err(|_| ConnectionClosed)
    }
}

/// Outcome of one broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BroadcastReport {
    /// Connections the signal was queued on.
    pub delivered: usize,
    /// Connections found closed (or failing) and removed.
    pub pruned: usize,
}

/// Currently open connections.
pub(crate) struct ConnectionSet<C> {
    connections: HashMap<ConnectionId, C>,
}

impl<C: Connection> ConnectionSet<C> {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: ConnectionId, connection: C) {
        self.connections.insert(id, connection);
    }

    /// Remove a connection. Returns `false` if it was already gone
    /// (e.g. pruned by an earlier broadcast).
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Send `signal` to every open connection.
    ///
    /// Closed connections are skipped and pruned. A failed send is logged and
    /// pruned as well; it never stops delivery to the rest.
    pub fn broadcast(&mut self, signal: ReloadSignal) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.connections.retain(|id, connection| {
            if !connection.is_open() {
                report.pruned += 1;
                return false;
            }
            match connection.send(signal) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(e) => {
                    tracing::warn!(connection = %id, error = %e, "Failed to send reload");
                    report.pruned += 1;
                    false
                }
            }
        });

        report
    }
}

//! The notifier's event loop.
//!
//! One task owns the connection set and the pending debounce timer. Socket
//! tasks and the watcher callback talk to it only through channels, so both
//! pieces of state are touched from exactly one place.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::connections::{ClientHandle, ConnectionId, ConnectionSet, ReloadSignal};
use super::debouncer::Debouncer;

/// Connection lifecycle messages from socket tasks.
pub(crate) enum HubEvent {
    Connected(ConnectionId, ClientHandle),
    Disconnected(ConnectionId),
}

pub(crate) struct Hub {
    watch_root: PathBuf,
    connections: ConnectionSet<ClientHandle>,
    debouncer: Debouncer,
    connection_count: watch::Sender<usize>,
}

impl Hub {
    /// Create a hub and a receiver that tracks the number of open connections.
    pub fn new(watch_root: PathBuf, debounce: Duration) -> (Self, watch::Receiver<usize>) {
        let (connection_count, count_rx) = watch::channel(0);
        let hub = Self {
            watch_root,
            connections: ConnectionSet::new(),
            debouncer: Debouncer::new(debounce),
            connection_count,
        };
        (hub, count_rx)
    }

    /// Run until `shutdown` fires or its sender is dropped.
    ///
    /// Dropping the hub on exit drops every [`ClientHandle`], which closes
    /// the remaining WebSocket connections.
    pub async fn run(
        mut self,
        mut clients: mpsc::Receiver<HubEvent>,
        mut fs_events: mpsc::Receiver<PathBuf>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                Some(event) = clients.recv() => self.on_client_event(event),
                Some(path) = fs_events.recv() => self.on_filesystem_event(path),
                path = self.debouncer.elapsed() => self.broadcast(&path),
            }
        }

        tracing::debug!(
            connections = self.connections.len(),
            "Live reload hub stopped"
        );
    }

    fn on_client_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Connected(id, handle) => {
                self.connections.insert(id, handle);
                tracing::info!(connection = %id, "Client connected for live reload");
            }
            HubEvent::Disconnected(id) => {
                if self.connections.remove(id) {
                    tracing::info!(connection = %id, "Client disconnected");
                }
            }
        }
        self.publish_count();
    }

    fn on_filesystem_event(&mut self, path: PathBuf) {
        tracing::debug!(
            path = %path.display(),
            restarted = self.debouncer.is_pending(),
            "Recorded filesystem event"
        );
        self.debouncer.record(path);
    }

    fn broadcast(&mut self, path: &Path) {
        let report = self.connections.broadcast(ReloadSignal);
        let shown = path.strip_prefix(&self.watch_root).unwrap_or(path);

        tracing::info!(
            path = %shown.display(),
            delivered = report.delivered,
            pruned = report.pruned,
            "File updated, sent reload"
        );

        if report.pruned > 0 {
            self.publish_count();
        }
    }

    fn publish_count(&self) {
        self.connection_count.send_replace(self.connections.len());
    }
}

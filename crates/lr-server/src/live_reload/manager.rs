//! Live reload notifier.
//!
//! Coordinates file watching and WebSocket broadcasting for live reload.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::hub::Hub;
use crate::NotifierConfig;
use crate::app;
use crate::error::NotifierError;
use crate::state::AppState;

/// Capacity of the channels feeding the hub.
const CHANNEL_CAPACITY: usize = 100;

/// Watches a directory and tells connected clients to reload.
///
/// Lifecycle is explicit: [`new`](Self::new) does no I/O,
/// [`start`](Self::start) begins watching and accepting connections, and
/// [`stop`](Self::stop) tears both down. Dropping a running notifier also
/// signals its tasks to finish, without waiting for them.
pub struct Notifier {
    config: NotifierConfig,
    running: Option<Running>,
}

/// Resources owned while the notifier is started.
struct Running {
    local_addr: SocketAddr,
    watcher: RecommendedWatcher,
    shutdown: watch::Sender<bool>,
    connections: watch::Receiver<usize>,
    hub: JoinHandle<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl Notifier {
    /// Create a notifier for the given configuration.
    #[must_use]
    pub fn new(config: NotifierConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// Start watching and accepting connections.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch root is not a directory, the watcher
    /// cannot be attached, the port cannot be bound, or the notifier is
    /// already running.
    pub async fn start(&mut self) -> Result<SocketAddr, NotifierError> {
        if self.running.is_some() {
            return Err(NotifierError::AlreadyStarted);
        }

        let root = &self.config.watch_root;
        if !root.is_dir() {
            return Err(NotifierError::WatchRoot(root.clone()));
        }

        let (fs_tx, fs_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let watcher = start_watcher(root, fs_tx)?;

        let address = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| NotifierError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let (hub_tx, hub_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (hub, connections) = Hub::new(root.clone(), self.config.debounce);
        let hub = tokio::spawn(hub.run(hub_rx, fs_rx, shutdown_rx.clone()));

        let router = app::create_router(Arc::new(AppState { hub: hub_tx }));
        let mut server_shutdown = shutdown_rx;
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.changed().await;
                })
                .await
        });

        tracing::info!(
            address = %local_addr,
            root = %root.display(),
            debounce_ms = self.config.debounce.as_millis(),
            "Live reload notifier started"
        );

        self.running = Some(Running {
            local_addr,
            watcher,
            shutdown,
            connections,
            hub,
            server,
        });
        Ok(local_addr)
    }

    /// Stop watching, close all connections and wait for background tasks.
    ///
    /// Does nothing if the notifier is not running.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // Watcher first so no new events race the shutdown
        drop(running.watcher);
        let _ = running.shutdown.send(true);

        if let Err(e) = running.hub.await {
            tracing::warn!(error = %e, "Live reload hub task failed");
        }
        match running.server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Live reload server failed"),
            Err(e) => tracing::warn!(error = %e, "Live reload server task failed"),
        }

        tracing::info!(address = %running.local_addr, "Live reload notifier stopped");
    }

    /// Whether [`start`](Self::start) has succeeded and `stop` not yet run.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Address the notifier is listening on, if running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Receiver tracking the number of open client connections, if running.
    #[must_use]
    pub fn connections(&self) -> Option<watch::Receiver<usize>> {
        self.running.as_ref().map(|r| r.connections.clone())
    }

    /// Configuration this notifier was created with.
    #[must_use]
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }
}

/// Attach a recursive watcher that forwards changed paths to `events`.
fn start_watcher(
    root: &Path,
    events: mpsc::Sender<PathBuf>,
) -> Result<RecommendedWatcher, notify::Error> {
    let fallback = root.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "File watcher error");
                return;
            }
        };

        if !is_change(&event.kind) {
            return;
        }

        // Rescans and some backend notices carry no paths
        let paths = if event.paths.is_empty() {
            vec![fallback.clone()]
        } else {
            event.paths
        };

        for path in paths {
            // The callback runs on notify's own thread, outside the runtime
            if events.blocking_send(path).is_err() {
                return;
            }
        }
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

/// Every event kind counts as a change except reads.
///
/// Access events (open, close-after-read) would otherwise turn a page load
/// that reads watched files into another reload.
fn is_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{Stream, StreamExt};
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind, RenameMode};
    use std::time::{Duration, Instant};
    use tokio_tungstenite::tungstenite::Message;

    fn config_for(root: &Path) -> NotifierConfig {
        NotifierConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
            watch_root: root.to_path_buf(),
            debounce: Duration::from_millis(100),
        }
    }

    /// Read the next text frame, skipping control frames.
    async fn next_text<S>(stream: &mut S) -> Option<String>
    where
        S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        while let Some(message) = stream.next().await {
            match message.ok()? {
                Message::Text(text) => return Some(text.as_str().to_owned()),
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    }

    #[test]
    fn test_is_change() {
        assert!(is_change(&EventKind::Create(CreateKind::File)));
        assert!(is_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_change(&EventKind::Modify(ModifyKind::Name(
            RenameMode::Both
        ))));
        assert!(is_change(&EventKind::Remove(RemoveKind::File)));
        assert!(is_change(&EventKind::Any));
        assert!(!is_change(&EventKind::Access(AccessKind::Any)));
    }

    #[tokio::test]
    async fn test_start_fails_for_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = Notifier::new(config_for(&dir.path().join("missing")));

        let err = notifier.start().await.unwrap_err();

        assert!(matches!(err, NotifierError::WatchRoot(_)));
        assert!(!notifier.is_running());
    }

    #[tokio::test]
    async fn test_start_fails_when_port_taken() {
        let dir = tempfile::tempdir().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = config_for(dir.path());
        config.port = taken.local_addr().unwrap().port();

        let err = Notifier::new(config).start().await.unwrap_err();

        assert!(matches!(err, NotifierError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = Notifier::new(config_for(dir.path()));

        notifier.start().await.unwrap();
        let err = notifier.start().await.unwrap_err();
        assert!(matches!(err, NotifierError::AlreadyStarted));

        notifier.stop().await;
        assert!(notifier.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = Notifier::new(config_for(dir.path()));
        notifier.stop().await;
        assert!(!notifier.is_running());
    }

    #[tokio::test]
    async fn test_file_write_reloads_every_client_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = Notifier::new(config_for(dir.path()));
        let addr = notifier.start().await.unwrap();
        let url = format!("ws://{addr}/");

        let (mut first, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let (mut second, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let mut connections = notifier.connections().unwrap();
        connections.wait_for(|n| *n == 2).await.unwrap();

        let written = Instant::now();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();

        let wait = Duration::from_secs(5);
        let first_msg = tokio::time::timeout(wait, next_text(&mut first)).await.unwrap();
        let second_msg = tokio::time::timeout(wait, next_text(&mut second)).await.unwrap();

        let latency = written.elapsed();

        assert_eq!(first_msg.as_deref(), Some("reload"));
        assert_eq!(second_msg.as_deref(), Some("reload"));
        assert!(latency >= Duration::from_millis(100), "reload after {latency:?}");
        // Target is 150 ms; the rest absorbs watcher latency on a loaded CI host
        assert!(latency < Duration::from_millis(400), "reload after {latency:?}");

        // Exactly one reload for the write
        let extra = tokio::time::timeout(Duration::from_millis(400), next_text(&mut first)).await;
        assert!(extra.is_err(), "unexpected second message: {extra:?}");

        notifier.stop().await;
    }

    #[tokio::test]
    async fn test_stop_closes_client_connections() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = Notifier::new(config_for(dir.path()));
        let addr = notifier.start().await.unwrap();

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
            .await
            .unwrap();
        let mut connections = notifier.connections().unwrap();
        connections.wait_for(|n| *n == 1).await.unwrap();

        notifier.stop().await;

        let closed = tokio::time::timeout(Duration::from_secs(5), next_text(&mut client))
            .await
            .unwrap();
        assert_eq!(closed, None);
    }

    #[tokio::test]
    async fn test_client_disconnect_shrinks_connection_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = Notifier::new(config_for(dir.path()));
        let addr = notifier.start().await.unwrap();

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
            .await
            .unwrap();
        let mut connections = notifier.connections().unwrap();
        connections.wait_for(|n| *n == 1).await.unwrap();

        client.close(None).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), connections.wait_for(|n| *n == 0))
            .await
            .unwrap()
            .unwrap();

        notifier.stop().await;
    }
}

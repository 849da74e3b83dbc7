//! The reconnecting listener.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::action::ReloadAction;
use crate::state::ListenerState;
use crate::transport::{Connector, MessageSource};
use crate::{DEFAULT_RECONNECT_DELAY, RELOAD_SIGNAL};

/// Stays connected to a notifier and runs a [`ReloadAction`] on `reload`.
///
/// After every close or failed attempt the listener waits exactly the
/// reconnect delay and tries once more, forever. There is no backoff and no
/// retry limit; the only way out is cancellation.
pub struct Listener<C, A> {
    connector: C,
    action: A,
    reconnect_delay: Duration,
    state: watch::Sender<ListenerState>,
}

impl<C, A> Listener<C, A>
where
    C: Connector,
    A: ReloadAction,
{
    /// Create a listener with the default one second reconnect delay.
    pub fn new(connector: C, action: A) -> Self {
        let (state, _) = watch::channel(ListenerState::Disconnected);
        Self {
            connector,
            action,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            state,
        }
    }

    /// Set the fixed delay between a disconnect and the next attempt.
    #[must_use]
    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Run in place until `shutdown` resolves.
    ///
    /// Whatever the listener is doing at that moment (connecting, reading or
    /// waiting to retry) is abandoned, and the state ends as `Disconnected`.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            () = self.run_forever() => {}
            () = shutdown => {}
        }
        self.set_state(ListenerState::Disconnected);
        tracing::debug!("Live reload listener stopped");
    }

    async fn run_forever(&mut self) {
        loop {
            self.connect_and_listen().await;
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One pass through `Connecting`, maybe `Connected`, back to `Disconnected`.
    async fn connect_and_listen(&mut self) {
        self.set_state(ListenerState::Connecting);

        match self.connector.connect().await {
            Ok(mut connection) => {
                self.set_state(ListenerState::Connected);
                tracing::info!("Connected for live reload");

                while let Some(payload) = connection.next_message().await {
                    self.on_message(&payload);
                }

                tracing::info!(
                    retry_ms = self.reconnect_delay.as_millis(),
                    "Live reload connection closed"
                );
            }
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    retry_ms = self.reconnect_delay.as_millis(),
                    "Live reload connection attempt failed"
                );
            }
        }

        self.set_state(ListenerState::Disconnected);
    }

    fn on_message(&mut self, payload: &str) {
        if payload == RELOAD_SIGNAL {
            tracing::info!("Reload requested");
            self.action.reload();
        } else {
            tracing::debug!(payload, "Ignoring unrecognized message");
        }
    }

    fn set_state(&self, state: ListenerState) {
        self.state.send_replace(state);
    }
}

impl<C, A> Listener<C, A>
where
    C: Connector + 'static,
    A: ReloadAction + 'static,
{
    /// Run on a background task.
    ///
    /// The returned handle is the cancellation hook: call
    /// [`ListenerHandle::stop`], or drop it.
    pub fn spawn(self) -> ListenerHandle {
        let state = self.state();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(self.run_until(async move {
            // A dropped handle counts as a stop request
            let _ = stopped.await;
        }));

        ListenerHandle { state, stop, task }
    }
}

/// Control handle for a spawned [`Listener`].
pub struct ListenerHandle {
    state: watch::Receiver<ListenerState>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state.clone()
    }

    /// State at this moment.
    pub fn current_state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Cancel the listener and wait for its task to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Live reload listener task failed");
        }
    }
}

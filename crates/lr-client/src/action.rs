//! What a listener does when told to reload.

/// Reload capability owned by the embedding application.
///
/// Implemented for any `FnMut()` closure, so simple callers can pass one
/// directly.
pub trait ReloadAction: Send {
    /// Refresh whatever this listener is responsible for.
    fn reload(&mut self);
}

impl<F> ReloadAction for F
where
    F: FnMut() + Send,
{
    fn reload(&mut self) {
        self();
    }
}

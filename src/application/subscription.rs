use tokio::sync::watch;

/// A consumer's handle on an engine's state.
///
/// Subscribing registers interest; dropping the handle (or calling
/// [`Subscription::unsubscribe`]) releases it. The engine never blocks on
/// subscribers and keeps working with none attached.
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(receiver: watch::Receiver<T>) -> Self {
        Self { receiver }
    }

    /// Returns a copy of the latest state and marks it as seen.
    pub fn current(&mut self) -> T {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next state change and returns it.
    ///
    /// Returns `None` once the engine has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// True if the state changed since it was last read through this handle.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    pub fn unsubscribe(self) {}
}

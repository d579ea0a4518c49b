use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cache::QueryState;

/// A mounted query. Holds the latest [`QueryState`] published by its poller; dropping the
/// subscription stops polling.
pub struct QuerySubscription<T> {
    receiver: watch::Receiver<QueryState<T>>,
    handle: JoinHandle<()>,
}

impl<T> QuerySubscription<T> {
    pub(super) fn new(receiver: watch::Receiver<QueryState<T>>, handle: JoinHandle<()>) -> Self {
        Self { receiver, handle }
    }

    pub fn current(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published state. `None` once the poller has stopped.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until a state that is not loading has been published.
    pub async fn settled(&mut self) -> Option<QueryState<T>> {
        let state = self
            .receiver
            .wait_for(|state| !state.is_loading)
            .await
            .ok()?
            .clone();
        Some(state)
    }
}

impl<T> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

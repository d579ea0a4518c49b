use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CommitOutcome, ListState, LoadTicket};
use crate::api::ApiError;
use crate::domain::Page;

/// Fetches one page of a list for the given filters.
#[async_trait]
pub trait PageLoader<T, F>: Send + Sync {
    async fn load(&self, filters: &F, page: u32) -> Result<Page<T>, ApiError>;
}

/// Releases the loading flag if a load's future is dropped before it commits. After a commit
/// the generation is no longer in flight and this does nothing.
struct PendingLoad<T, F> {
    state: Arc<Mutex<ListState<T, F>>>,
    generation: u64,
}

impl<T, F> Drop for PendingLoad<T, F> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.abandon(self.generation);
        }
    }
}

/// A [`ListState`] shared between the view and the tasks loading into it.
pub struct PagedFeed<T, F> {
    state: Arc<Mutex<ListState<T, F>>>,
    loader: Arc<dyn PageLoader<T, F>>,
}

impl<T, F> Clone for PagedFeed<T, F> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            loader: self.loader.clone(),
        }
    }
}

impl<T, F> PagedFeed<T, F>
where
    T: Clone + Send + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new(loader: Arc<dyn PageLoader<T, F>>, filters: F) -> Self {
        Self {
            state: Arc::new(Mutex::new(ListState::new(filters))),
            loader,
        }
    }

    fn state(&self) -> MutexGuard<'_, ListState<T, F>> {
        self.state.lock().expect("list state mutex poisoned")
    }

    /// Load page 1 for `filters`, replacing the list.
    pub async fn refresh(&self, filters: F) -> CommitOutcome {
        let ticket = self.state().begin_refresh(filters);
        self.run(ticket).await
    }

    /// Reload page 1 with the current filters (pull-to-refresh).
    pub async fn reload(&self) -> CommitOutcome {
        let filters = self.state().filters().clone();
        self.refresh(filters).await
    }

    /// Append the next page. `None` when there is nothing more or a load is already running.
    pub async fn load_more(&self) -> Option<CommitOutcome> {
        let ticket = self.state().begin_load_more()?;
        Some(self.run(ticket).await)
    }

    async fn run(&self, ticket: LoadTicket<F>) -> CommitOutcome {
        let _pending = PendingLoad {
            state: self.state.clone(),
            generation: ticket.generation(),
        };
        let result = self.loader.load(ticket.filters(), ticket.page()).await;
        self.state().commit(ticket, result)
    }

    pub fn items(&self) -> Vec<T> {
        self.state().items().to_vec()
    }

    pub fn find(&self, matches: impl Fn(&T) -> bool) -> Option<T> {
        self.state().items().iter().find(|item| matches(item)).cloned()
    }

    pub fn patch_where(&self, matches: impl Fn(&T) -> bool, patch: impl FnMut(&mut T)) -> usize {
        self.state().patch_where(matches, patch)
    }

    /// Read the full state under the lock.
    pub fn inspect<R>(&self, view: impl FnOnce(&ListState<T, F>) -> R) -> R {
        view(&self.state())
    }
}

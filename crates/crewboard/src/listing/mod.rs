//! Paginated lists held in view state, outside the query cache.
//!
//! Every load is stamped with a generation. Only the newest load may write to the list, so a
//! slow response for an old filter can never overwrite results for the current one.

mod feed;

pub use feed::{PageLoader, PagedFeed};

use tracing::debug;

use crate::api::ApiError;
use crate::domain::Page;

/// Permission to write one response into a [`ListState`].
#[derive(Debug, Clone)]
pub struct LoadTicket<F> {
    generation: u64,
    page: u32,
    append: bool,
    filters: F,
}

impl<F> LoadTicket<F> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_append(&self) -> bool {
        self.append
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// A newer load was issued after this one; the response was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct ListState<T, F> {
    filters: F,
    items: Vec<T>,
    count: u64,
    page: u32,
    next_page: Option<u32>,
    generation: u64,
    in_flight: Option<u64>,
    error: Option<ApiError>,
    loaded: bool,
}

impl<T, F> ListState<T, F> {
    /// Give up on a load that will never commit. Clears the loading flag only if that load is
    /// still the one in flight; items and filters are left alone.
    pub fn abandon(&mut self, generation: u64) -> bool {
        if self.in_flight != Some(generation) {
            return false;
        }
        debug!(generation, "list load abandoned before its response arrived");
        self.in_flight = None;
        true
    }
}

impl<T, F: Clone> ListState<T, F> {
    pub fn new(filters: F) -> Self {
        Self {
            filters,
            items: Vec::new(),
            count: 0,
            page: 0,
            next_page: None,
            generation: 0,
            in_flight: None,
            error: None,
            loaded: false,
        }
    }

    /// Start a page-1 load. Always allowed; supersedes anything in flight.
    pub fn begin_refresh(&mut self, filters: F) -> LoadTicket<F> {
        self.filters = filters;
        self.issue(1, false)
    }

    /// Start loading the next page. `None` when there is no next page or a load is running.
    pub fn begin_load_more(&mut self) -> Option<LoadTicket<F>> {
        if self.in_flight.is_some() {
            return None;
        }
        let next = self.next_page?;
        Some(self.issue(next, true))
    }

    fn issue(&mut self, page: u32, append: bool) -> LoadTicket<F> {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        LoadTicket {
            generation: self.generation,
            page,
            append,
            filters: self.filters.clone(),
        }
    }

    pub fn commit(
        &mut self,
        ticket: LoadTicket<F>,
        result: Result<Page<T>, ApiError>,
    ) -> CommitOutcome {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                page = ticket.page,
                "dropping superseded list response"
            );
            return CommitOutcome::Superseded;
        }

        self.in_flight = None;
        match result {
            Ok(page) => {
                self.next_page = page.next_page(ticket.page);
                self.count = page.count;
                if ticket.append {
                    self.items.extend(page.results);
                } else {
                    self.items = page.results;
                }
                self.page = ticket.page;
                self.error = None;
                self.loaded = true;
            }
            Err(error) => self.error = Some(error),
        }
        CommitOutcome::Applied
    }

    /// Update already-fetched items in place. Returns how many were touched.
    pub fn patch_where(
        &mut self,
        matches: impl Fn(&T) -> bool,
        mut patch: impl FnMut(&mut T),
    ) -> usize {
        let mut patched = 0;
        for item in self.items.iter_mut().filter(|item| matches(item)) {
            patch(item);
            patched += 1;
        }
        patched
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: &[&'static str], next: Option<u32>) -> Page<&'static str> {
        Page {
            results: items.to_vec(),
            count: 4,
            next: next.map(|page| format!("https://api.example/jobs/?page={page}")),
        }
    }

    #[test]
    fn load_more_appends_and_refresh_replaces() {
        let mut state = ListState::new("all");

        let first = state.begin_refresh("all");
        assert_eq!(
            state.commit(first, Ok(page(&["A", "B"], Some(2)))),
            CommitOutcome::Applied
        );

        let more = state.begin_load_more().expect("has a next page");
        assert_eq!(more.page(), 2);
        state.commit(more, Ok(page(&["C", "D"], None)));
        assert_eq!(state.items(), &["A", "B", "C", "D"]);
        assert!(!state.has_more());
        assert!(state.begin_load_more().is_none());

        let refresh = state.begin_refresh("roofing");
        state.commit(refresh, Ok(page(&["E"], None)));
        assert_eq!(state.items(), &["E"]);
        assert_eq!(*state.filters(), "roofing");
    }

    #[test]
    fn superseded_responses_are_dropped() {
        let mut state = ListState::new("plumbing");

        let slow = state.begin_refresh("plumbing");
        let fast = state.begin_refresh("electrical");

        assert_eq!(
            state.commit(fast, Ok(page(&["E1"], None))),
            CommitOutcome::Applied
        );
        assert_eq!(
            state.commit(slow, Ok(page(&["P1", "P2"], Some(2)))),
            CommitOutcome::Superseded
        );
        assert_eq!(state.items(), &["E1"]);
        assert!(!state.has_more());
    }

    #[test]
    fn load_more_waits_for_running_load() {
        let mut state = ListState::new(());
        let first = state.begin_refresh(());
        state.commit(first, Ok(page(&["A"], Some(2))));

        let _running = state.begin_load_more().expect("first load-more");
        assert!(state.begin_load_more().is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn abandoned_load_more_can_be_retried() {
        let mut state = ListState::new(());
        let first = state.begin_refresh(());
        state.commit(first, Ok(page(&["A"], Some(2))));

        let lost = state.begin_load_more().expect("next page");
        assert!(state.abandon(lost.generation()));
        assert!(!state.is_loading());

        let retry = state.begin_load_more().expect("retry after abandon");
        assert_eq!(retry.page(), 2);
        state.commit(retry, Ok(page(&["B"], None)));
        assert_eq!(state.items(), &["A", "B"]);
    }

    #[test]
    fn abandoning_an_old_load_keeps_the_newer_one_running() {
        let mut state: ListState<&str, &str> = ListState::new("plumbing");
        let old = state.begin_refresh("plumbing");
        let _current = state.begin_refresh("electrical");

        assert!(!state.abandon(old.generation()));
        assert!(state.is_loading());
    }

    #[test]
    fn failed_append_keeps_items() {
        let mut state = ListState::new(());
        let first = state.begin_refresh(());
        state.commit(first, Ok(page(&["A", "B"], Some(2))));

        let more = state.begin_load_more().expect("next page");
        state.commit(more, Err(ApiError::transport("offline")));

        assert_eq!(state.items(), &["A", "B"]);
        assert!(state.error().is_some());
        assert!(!state.is_loading());
        assert!(state.has_more());
    }

    #[test]
    fn patch_touches_only_matching_items() {
        let mut state = ListState::new(());
        let first = state.begin_refresh(());
        state.commit(
            first,
            Ok(Page {
                results: vec![(1, 0), (2, 0), (3, 0)],
                count: 3,
                next: None,
            }),
        );

        let patched = state.patch_where(|(id, _)| *id == 2, |(_, count)| *count += 1);
        assert_eq!(patched, 1);
        assert_eq!(state.items(), &[(1, 0), (2, 1), (3, 0)]);
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use super::Session;
use crate::api::{ApiError, MarketplaceApi};
use crate::domain::{Conversation, Page, UserId, WorkerFilters, WorkerProfile};
use crate::listing::{CommitOutcome, PageLoader, PagedFeed};
use crate::sync::{MarketplaceSync, SyncError};

struct WorkersLoader {
    api: Arc<dyn MarketplaceApi>,
    token: Option<String>,
}

#[async_trait]
impl PageLoader<WorkerProfile, WorkerFilters> for WorkersLoader {
    async fn load(
        &self,
        filters: &WorkerFilters,
        page: u32,
    ) -> Result<Page<WorkerProfile>, ApiError> {
        self.api
            .list_workers(self.token.as_deref(), filters, page)
            .await
    }
}

/// The workers/companies browse screen.
#[derive(Clone)]
pub struct WorkerDirectory {
    sync: MarketplaceSync,
    session: Session,
    feed: PagedFeed<WorkerProfile, WorkerFilters>,
}

impl WorkerDirectory {
    pub fn new(sync: MarketplaceSync, session: Session) -> Self {
        let loader = Arc::new(WorkersLoader {
            api: sync.api().clone(),
            token: session.token.clone(),
        });
        Self {
            sync,
            session,
            feed: PagedFeed::new(loader, WorkerFilters::default()),
        }
    }

    pub fn feed(&self) -> &PagedFeed<WorkerProfile, WorkerFilters> {
        &self.feed
    }

    pub fn workers(&self) -> Vec<WorkerProfile> {
        self.feed.items()
    }

    pub async fn search(&self, filters: WorkerFilters) -> CommitOutcome {
        self.feed.refresh(filters).await
    }

    pub async fn load_more(&self) -> Option<CommitOutcome> {
        self.feed.load_more().await
    }

    /// "Message" button on a profile card.
    pub async fn contact(&self, user_id: UserId) -> Result<Conversation, SyncError> {
        self.sync
            .get_or_create_conversation(self.session.token(), user_id)
            .await
    }
}

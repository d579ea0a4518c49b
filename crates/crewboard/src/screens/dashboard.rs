use std::collections::BTreeMap;

use super::Session;
use crate::domain::{Ack, Application, ApplicationStatus, Page};
use crate::query::QueryState;
use crate::sync::{MarketplaceSync, SyncError};

/// Tab badges for the applicant's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationsSummary {
    pub by_status: BTreeMap<ApplicationStatus, usize>,
    pub active: usize,
    pub closed: usize,
    pub total: u64,
}

impl ApplicationsSummary {
    pub fn from_page(page: &Page<Application>) -> Self {
        let mut summary = Self {
            total: page.count,
            ..Self::default()
        };
        for application in &page.results {
            *summary.by_status.entry(application.status).or_default() += 1;
            if application.status.is_terminal() {
                summary.closed += 1;
            } else {
                summary.active += 1;
            }
        }
        summary
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    Withdrawn(Ack),
    /// The application is already final; nothing was sent.
    NotAllowed,
}

/// "My applications" screen with an optional status tab.
#[derive(Clone)]
pub struct ApplicationsDashboard {
    sync: MarketplaceSync,
    session: Session,
    status: Option<ApplicationStatus>,
}

impl ApplicationsDashboard {
    pub fn new(sync: MarketplaceSync, session: Session) -> Self {
        Self {
            sync,
            session,
            status: None,
        }
    }

    pub fn select_status(&mut self, status: Option<ApplicationStatus>) {
        self.status = status;
    }

    pub fn status(&self) -> Option<ApplicationStatus> {
        self.status
    }

    pub async fn applications(&self, page: u32) -> QueryState<Page<Application>> {
        self.sync
            .my_applications(self.session.token(), self.status, page)
            .await
    }

    /// Tab strip counts, computed from the first unfiltered page.
    pub async fn summary(&self) -> Option<ApplicationsSummary> {
        let state = self
            .sync
            .my_applications(self.session.token(), None, 1)
            .await;
        state.data.map(|page| ApplicationsSummary::from_page(&page))
    }

    pub async fn withdraw(&self, application: &Application) -> Result<WithdrawOutcome, SyncError> {
        if !application.can_withdraw() {
            return Ok(WithdrawOutcome::NotAllowed);
        }
        let ack = self
            .sync
            .withdraw_application(self.session.token(), application.id)
            .await?;
        Ok(WithdrawOutcome::Withdrawn(ack))
    }
}

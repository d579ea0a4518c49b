//! View-level orchestration on top of [`crate::sync`] and [`crate::listing`].
//!
//! These types own the UI-only state a screen needs (filters, pagination, drafts, in-flight
//! flags) and decide client-side when an action is a no-op.

mod composer;
mod dashboard;
mod job_board;
mod workers;

pub use composer::{MessageComposer, SendOutcome};
pub use dashboard::{ApplicationsDashboard, ApplicationsSummary, WithdrawOutcome};
pub use job_board::{plan_application, ApplyOutcome, ApplyPlan, JobBoard};
pub use workers::WorkerDirectory;

use crate::domain::AccountKind;

/// Who is using the client. `token` is `None` while signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub account: Option<AccountKind>,
}

impl Session {
    pub fn signed_in(token: impl Into<String>, account: AccountKind) -> Self {
        Self {
            token: Some(token.into()),
            account: Some(account),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

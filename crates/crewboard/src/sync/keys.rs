//! Query keys and invalidation filters for every cached resource.

use crate::domain::{ApplicationStatus, ConversationId, JobId};
use crate::query::{KeyFilter, QueryKey};

pub const MY_APPLICATIONS: &str = "applications.mine";
pub const JOB_APPLICATIONS: &str = "applications.job";
pub const JOB_DETAIL: &str = "jobs.detail";
pub const CONVERSATIONS: &str = "messaging.conversations";
pub const MESSAGES: &str = "messaging.messages";
pub const UNREAD: &str = "messaging.unread";

pub fn my_applications(status: Option<ApplicationStatus>, page: u32) -> QueryKey {
    QueryKey::new(MY_APPLICATIONS)
        .with("status", status.map(ApplicationStatus::label))
        .with("page", page)
}

pub fn job_applications(job_id: JobId, status: Option<ApplicationStatus>, page: u32) -> QueryKey {
    QueryKey::new(JOB_APPLICATIONS)
        .with("job", job_id.0)
        .with("status", status.map(ApplicationStatus::label))
        .with("page", page)
}

/// `has_applied` depends on who is asking, so signed-in and anonymous reads are cached apart.
pub fn job_detail(job_id: JobId, signed_in: bool) -> QueryKey {
    QueryKey::new(JOB_DETAIL)
        .with("job", job_id.0)
        .with("viewer", u32::from(signed_in))
}

pub fn conversations() -> QueryKey {
    QueryKey::new(CONVERSATIONS)
}

pub fn conversation_messages(conversation_id: ConversationId, page: u32) -> QueryKey {
    QueryKey::new(MESSAGES)
        .with("conversation", conversation_id.0)
        .with("page", page)
}

pub fn unread_count() -> QueryKey {
    QueryKey::new(UNREAD)
}

pub fn applications_for_job(job_id: JobId) -> KeyFilter {
    KeyFilter::resource(JOB_APPLICATIONS).with("job", job_id.0)
}

pub fn job_detail_of(job_id: JobId) -> KeyFilter {
    KeyFilter::resource(JOB_DETAIL).with("job", job_id.0)
}

pub fn messages_in(conversation_id: ConversationId) -> KeyFilter {
    KeyFilter::resource(MESSAGES).with("conversation", conversation_id.0)
}

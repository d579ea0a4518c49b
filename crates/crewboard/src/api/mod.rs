//! Boundary with the marketplace REST backend.
//!
//! [`MarketplaceApi`] is the seam the sync layer consumes; [`HttpApi`] is the production
//! implementation and tests substitute in-memory doubles.

mod error;
mod http;

pub use error::{ApiError, ErrorClass};
pub use http::HttpApi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Ack, Application, ApplicationId, ApplicationStatus, Conversation, ConversationId, Job,
    JobFilters, JobId, Message, Page, UnreadCount, UserId, WorkerFilters, WorkerProfile,
};

/// Body for `POST /jobs/{id}/apply/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
}

/// Typed calls against the backend. Each returns decoded JSON or an [`ApiError`] carrying the
/// HTTP status and parsed error body.
#[async_trait]
pub trait MarketplaceApi: Send + Sync + 'static {
    async fn list_jobs(
        &self,
        token: Option<&str>,
        filters: &JobFilters,
        page: u32,
    ) -> Result<Page<Job>, ApiError>;

    async fn get_job(&self, token: Option<&str>, job_id: JobId) -> Result<Job, ApiError>;

    async fn apply_to_job(
        &self,
        token: &str,
        job_id: JobId,
        request: &ApplyRequest,
    ) -> Result<Application, ApiError>;

    async fn list_workers(
        &self,
        token: Option<&str>,
        filters: &WorkerFilters,
        page: u32,
    ) -> Result<Page<WorkerProfile>, ApiError>;

    async fn my_applications(
        &self,
        token: &str,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> Result<Page<Application>, ApiError>;

    async fn job_applications(
        &self,
        token: &str,
        job_id: JobId,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> Result<Page<Application>, ApiError>;

    async fn withdraw_application(
        &self,
        token: &str,
        application_id: ApplicationId,
    ) -> Result<Ack, ApiError>;

    async fn update_application_status(
        &self,
        token: &str,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError>;

    async fn conversations(&self, token: &str) -> Result<Page<Conversation>, ApiError>;

    async fn conversation_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ApiError>;

    async fn unread_count(&self, token: &str) -> Result<UnreadCount, ApiError>;

    async fn get_or_create_conversation(
        &self,
        token: &str,
        user_id: UserId,
    ) -> Result<Conversation, ApiError>;

    async fn send_message(
        &self,
        token: &str,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Message, ApiError>;

    async fn mark_conversation_read(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Ack, ApiError>;
}

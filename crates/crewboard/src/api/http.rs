use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{ApiError, ApplyRequest, MarketplaceApi};
use crate::domain::{
    Ack, Application, ApplicationId, ApplicationStatus, Conversation, ConversationId, Job,
    JobFilters, JobId, Message, Page, UnreadCount, UserId, WorkerFilters, WorkerProfile,
};

/// `reqwest`-backed client for the marketplace REST API.
///
/// No request timeout is set; a hung request stays pending until the transport gives up.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    page_size: u32,
}

impl HttpApi {
    pub fn new(base_url: Url, page_size: u32) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("crewboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, page_size))
    }

    pub fn with_client(client: Client, base_url: Url, page_size: u32) -> Self {
        Self {
            client,
            base_url,
            page_size,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ApiError::transport(format!("invalid endpoint '{path}': {err}")))?;
        Ok(self.client.request(method, url))
    }

    fn page_params(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("page", page.to_string()),
            ("page_size", self.page_size.to_string()),
        ]
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut builder = builder.header(ACCEPT, "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.bytes().await?;
        debug!(%status, path = %url, bytes = body.len(), "backend response");

        if !status.is_success() {
            let data = serde_json::from_slice::<Value>(&body).ok();
            return Err(ApiError::http(status.as_u16(), data));
        }

        // Action endpoints may answer 204 with no body.
        let body: &[u8] = if body.is_empty() { b"{}" } else { &body };
        serde_json::from_slice(body)
            .map_err(|err| ApiError::decode(status.as_u16(), err.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send(builder, token).await
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        token: &str,
    ) -> Result<T, ApiError> {
        let builder = self.request(method, path)?.json(body);
        self.send(builder, Some(token)).await
    }
}

fn with_status(
    mut query: Vec<(&'static str, String)>,
    status: Option<ApplicationStatus>,
) -> Vec<(&'static str, String)> {
    if let Some(status) = status {
        query.push(("status", status.label().to_string()));
    }
    query
}

#[async_trait]
impl MarketplaceApi for HttpApi {
    async fn list_jobs(
        &self,
        token: Option<&str>,
        filters: &JobFilters,
        page: u32,
    ) -> Result<Page<Job>, ApiError> {
        let mut query = self.page_params(page);
        query.extend(filters.query_pairs());
        self.get("jobs/", &query, token).await
    }

    async fn get_job(&self, token: Option<&str>, job_id: JobId) -> Result<Job, ApiError> {
        self.get(&format!("jobs/{job_id}/"), &[], token).await
    }

    async fn apply_to_job(
        &self,
        token: &str,
        job_id: JobId,
        request: &ApplyRequest,
    ) -> Result<Application, ApiError> {
        self.write(Method::POST, &format!("jobs/{job_id}/apply/"), request, token)
            .await
    }

    async fn list_workers(
        &self,
        token: Option<&str>,
        filters: &WorkerFilters,
        page: u32,
    ) -> Result<Page<WorkerProfile>, ApiError> {
        let mut query = self.page_params(page);
        query.extend(filters.query_pairs());
        self.get("workers/", &query, token).await
    }

    async fn my_applications(
        &self,
        token: &str,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> Result<Page<Application>, ApiError> {
        let query = with_status(self.page_params(page), status);
        self.get("applications/mine/", &query, Some(token)).await
    }

    async fn job_applications(
        &self,
        token: &str,
        job_id: JobId,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> Result<Page<Application>, ApiError> {
        let query = with_status(self.page_params(page), status);
        self.get(&format!("jobs/{job_id}/applications/"), &query, Some(token))
            .await
    }

    async fn withdraw_application(
        &self,
        token: &str,
        application_id: ApplicationId,
    ) -> Result<Ack, ApiError> {
        self.write(
            Method::POST,
            &format!("applications/{application_id}/withdraw/"),
            &json!({}),
            token,
        )
        .await
    }

    async fn update_application_status(
        &self,
        token: &str,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        self.write(
            Method::PATCH,
            &format!("applications/{application_id}/status/"),
            &json!({ "status": status.label() }),
            token,
        )
        .await
    }

    async fn conversations(&self, token: &str) -> Result<Page<Conversation>, ApiError> {
        self.get("messaging/conversations/", &[], Some(token)).await
    }

    async fn conversation_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ApiError> {
        let query = self.page_params(page);
        self.get(
            &format!("messaging/conversations/{conversation_id}/messages/"),
            &query,
            Some(token),
        )
        .await
    }

    async fn unread_count(&self, token: &str) -> Result<UnreadCount, ApiError> {
        self.get("messaging/unread-count/", &[], Some(token)).await
    }

    async fn get_or_create_conversation(
        &self,
        token: &str,
        user_id: UserId,
    ) -> Result<Conversation, ApiError> {
        self.write(
            Method::POST,
            "messaging/conversations/",
            &json!({ "user_id": user_id }),
            token,
        )
        .await
    }

    async fn send_message(
        &self,
        token: &str,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Message, ApiError> {
        self.write(
            Method::POST,
            &format!("messaging/conversations/{conversation_id}/messages/"),
            &json!({ "content": content }),
            token,
        )
        .await
    }

    async fn mark_conversation_read(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Ack, ApiError> {
        self.write(
            Method::POST,
            &format!("messaging/conversations/{conversation_id}/read/"),
            &json!({}),
            token,
        )
        .await
    }
}

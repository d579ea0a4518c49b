#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crewboard::api::{ApiError, ApplyRequest, MarketplaceApi};
use crewboard::config::SyncConfig;
use crewboard::domain::{
    Ack, AccountKind, Application, ApplicationId, ApplicationStatus, Conversation,
    ConversationId, Job, JobFilters, JobId, JobRole, JobStatus, JobType, Message, MessageId,
    OtherParty, Page, PaymentType, Sender, UnreadCount, UserId, WorkerFilters, WorkerProfile,
};
use crewboard::query::QueryCache;
use crewboard::sync::MarketplaceSync;

pub const TOKEN: &str = "token-abc";
pub const ME: UserId = UserId(100);

#[derive(Default)]
pub struct Backend {
    pub jobs: Vec<Job>,
    pub workers: Vec<WorkerProfile>,
    pub applications: Vec<Application>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub unread: u64,
}

/// In-memory backend double that records every call. It can slow down job searches and
/// hold chosen operations open forever.
pub struct MockApi {
    pub backend: Mutex<Backend>,
    calls: Mutex<Vec<String>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    stalled: Mutex<HashSet<&'static str>>,
    page_size: usize,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::with_page_size(2)
    }
}

impl MockApi {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            backend: Mutex::new(Backend::default()),
            calls: Mutex::new(Vec::new()),
            search_delays: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            stalled: Mutex::new(HashSet::new()),
            page_size,
        }
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .iter()
            .filter(|call| call.as_str() == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls mutex poisoned").len()
    }

    pub fn delay_search(&self, search: &str, delay: Duration) {
        self.search_delays
            .lock()
            .expect("delay mutex poisoned")
            .insert(search.to_string(), delay);
    }

    pub fn fail(&self, operation: &'static str, error: ApiError) {
        self.failures
            .lock()
            .expect("failure mutex poisoned")
            .insert(operation, error);
    }

    /// Calls to `operation` made from now on never complete.
    pub fn stall(&self, operation: &'static str) {
        self.stalled
            .lock()
            .expect("stall mutex poisoned")
            .insert(operation);
    }

    pub fn resume(&self, operation: &'static str) {
        self.stalled
            .lock()
            .expect("stall mutex poisoned")
            .remove(operation);
    }

    async fn hold_if_stalled(&self, operation: &'static str) {
        let stalled = self
            .stalled
            .lock()
            .expect("stall mutex poisoned")
            .contains(operation);
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    pub fn with_backend<R>(&self, edit: impl FnOnce(&mut Backend) -> R) -> R {
        edit(&mut self.backend.lock().expect("backend mutex poisoned"))
    }

    fn record(&self, operation: &'static str) -> Result<(), ApiError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(operation.to_string());
        match self
            .failures
            .lock()
            .expect("failure mutex poisoned")
            .get(operation)
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn paginate<T: Clone>(&self, items: Vec<T>, page: u32, path: &str) -> Page<T> {
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        let results: Vec<T> = items.iter().skip(start).take(self.page_size).cloned().collect();
        let next = (start + results.len() < items.len())
            .then(|| format!("http://mock.invalid/{path}?page={}", page + 1));
        Page {
            results,
            count: items.len() as u64,
            next,
        }
    }
}

#[async_trait]
impl MarketplaceApi for MockApi {
    async fn list_jobs(
        &self,
        _token: Option<&str>,
        filters: &JobFilters,
        page: u32,
    ) -> Result<Page<Job>, ApiError> {
        self.record("list_jobs")?;
        self.hold_if_stalled("list_jobs").await;
        let search = filters.search.clone().unwrap_or_default();
        let delay = self
            .search_delays
            .lock()
            .expect("delay mutex poisoned")
            .get(&search)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let jobs: Vec<Job> = self.with_backend(|backend| {
            backend
                .jobs
                .iter()
                .filter(|job| search.is_empty() || job.title.contains(&search))
                .cloned()
                .collect()
        });
        Ok(self.paginate(jobs, page, "jobs/"))
    }

    async fn get_job(&self, token: Option<&str>, job_id: JobId) -> Result<Job, ApiError> {
        self.record("get_job")?;
        let job = self
            .with_backend(|backend| backend.jobs.iter().find(|job| job.id == job_id).cloned())
            .ok_or_else(|| {
                ApiError::http(404, Some(serde_json::json!({"detail": "Not found."})))
            })?;
        // Anonymous viewers never see their own application state.
        Ok(Job {
            has_applied: job.has_applied && token.is_some(),
            ..job
        })
    }

    async fn apply_to_job(
        &self,
        _token: &str,
        job_id: JobId,
        request: &ApplyRequest,
    ) -> Result<Application, ApiError> {
        self.record("apply_to_job")?;
        self.with_backend(|backend| {
            let id = ApplicationId(backend.applications.len() as u64 + 1);
            let created = application(id.0, job_id.0, ApplicationStatus::Pending);
            let created = Application {
                role_name: request.role_name.clone(),
                cover_letter: request.cover_letter.clone(),
                ..created
            };
            backend.applications.push(created.clone());
            if let Some(job) = backend.jobs.iter_mut().find(|job| job.id == job_id) {
                job.has_applied = true;
                job.applications_count += 1;
            }
            Ok(created)
        })
    }

    async fn list_workers(
        &self,
        _token: Option<&str>,
        filters: &WorkerFilters,
        page: u32,
    ) -> Result<Page<WorkerProfile>, ApiError> {
        self.record("list_workers")?;
        let trade = filters.trade.clone();
        let workers: Vec<WorkerProfile> = self.with_backend(|backend| {
            backend
                .workers
                .iter()
                .filter(|worker| trade.is_none() || worker.trade == trade)
                .cloned()
                .collect()
        });
        Ok(self.paginate(workers, page, "workers/"))
    }

    async fn my_applications(
        &self,
        _token: &str,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> Result<Page<Application>, ApiError> {
        self.record("my_applications")?;
        let mine: Vec<Application> = self.with_backend(|backend| {
            backend
                .applications
                .iter()
                .filter(|app| app.applicant == ME)
                .filter(|app| status.map_or(true, |status| app.status == status))
                .cloned()
                .collect()
        });
        Ok(self.paginate(mine, page, "applications/mine/"))
    }

    async fn job_applications(
        &self,
        _token: &str,
        job_id: JobId,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> Result<Page<Application>, ApiError> {
        self.record("job_applications")?;
        let received: Vec<Application> = self.with_backend(|backend| {
            backend
                .applications
                .iter()
                .filter(|app| app.job == job_id)
                .filter(|app| status.map_or(true, |status| app.status == status))
                .cloned()
                .collect()
        });
        Ok(self.paginate(received, page, "applications/"))
    }

    async fn withdraw_application(
        &self,
        _token: &str,
        application_id: ApplicationId,
    ) -> Result<Ack, ApiError> {
        self.record("withdraw_application")?;
        self.with_backend(|backend| {
            let app = backend
                .applications
                .iter_mut()
                .find(|app| app.id == application_id)
                .ok_or_else(|| ApiError::http(404, None))?;
            app.status = ApplicationStatus::Withdrawn;
            Ok(Ack {
                success: true,
                message: Some("Application withdrawn".to_string()),
            })
        })
    }

    async fn update_application_status(
        &self,
        _token: &str,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        self.record("update_application_status")?;
        self.with_backend(|backend| {
            let app = backend
                .applications
                .iter_mut()
                .find(|app| app.id == application_id)
                .ok_or_else(|| ApiError::http(404, None))?;
            app.status = status;
            Ok(app.clone())
        })
    }

    async fn conversations(&self, _token: &str) -> Result<Page<Conversation>, ApiError> {
        self.record("conversations")?;
        let conversations = self.with_backend(|backend| backend.conversations.clone());
        Ok(Page {
            count: conversations.len() as u64,
            results: conversations,
            next: None,
        })
    }

    async fn conversation_messages(
        &self,
        _token: &str,
        conversation_id: ConversationId,
        page: u32,
    ) -> Result<Page<Message>, ApiError> {
        self.record("conversation_messages")?;
        let messages: Vec<Message> = self.with_backend(|backend| {
            backend
                .messages
                .iter()
                .filter(|message| message.conversation == conversation_id)
                .cloned()
                .collect()
        });
        Ok(self.paginate(messages, page, "messages/"))
    }

    async fn unread_count(&self, _token: &str) -> Result<UnreadCount, ApiError> {
        self.record("unread_count")?;
        Ok(UnreadCount {
            unread_count: self.with_backend(|backend| backend.unread),
        })
    }

    async fn get_or_create_conversation(
        &self,
        _token: &str,
        user_id: UserId,
    ) -> Result<Conversation, ApiError> {
        self.record("get_or_create_conversation")?;
        self.with_backend(|backend| {
            if let Some(existing) = backend
                .conversations
                .iter()
                .find(|conversation| conversation.other_party.id == user_id)
            {
                return Ok(existing.clone());
            }
            let created = conversation(backend.conversations.len() as u64 + 1, user_id.0);
            backend.conversations.push(created.clone());
            Ok(created)
        })
    }

    async fn send_message(
        &self,
        _token: &str,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Message, ApiError> {
        self.record("send_message")?;
        self.hold_if_stalled("send_message").await;
        self.with_backend(|backend| {
            let sent = message(
                backend.messages.len() as u64 + 1,
                conversation_id.0,
                ME.0,
                content,
            );
            backend.messages.push(sent.clone());
            if let Some(conversation) = backend
                .conversations
                .iter_mut()
                .find(|conversation| conversation.id == conversation_id)
            {
                conversation.last_message = Some(content.to_string());
            }
            Ok(sent)
        })
    }

    async fn mark_conversation_read(
        &self,
        _token: &str,
        conversation_id: ConversationId,
    ) -> Result<Ack, ApiError> {
        self.record("mark_conversation_read")?;
        self.with_backend(|backend| {
            for conversation in backend
                .conversations
                .iter_mut()
                .filter(|conversation| conversation.id == conversation_id)
            {
                backend.unread = backend
                    .unread
                    .saturating_sub(u64::from(conversation.unread_count));
                conversation.unread_count = 0;
            }
            Ok(Ack {
                success: true,
                message: None,
            })
        })
    }
}

pub fn sync_with(api: Arc<MockApi>) -> MarketplaceSync {
    MarketplaceSync::new(api, QueryCache::new(), SyncConfig::default())
}

pub fn job(id: u64, title: &str, roles: &[&str]) -> Job {
    Job {
        id: JobId(id),
        title: title.to_string(),
        category: Some("construction".to_string()),
        roles: roles
            .iter()
            .map(|role| JobRole {
                role_name: role.to_string(),
                quantity: 1,
            })
            .collect(),
        required_skills: BTreeSet::new(),
        description: format!("{title} on site"),
        location: Some("Denver".to_string()),
        job_type: JobType::ShortProject,
        payment_type: PaymentType::Hourly,
        budget_min: Some(30.0),
        budget_max: Some(45.0),
        status: JobStatus::Published,
        accepts_individual_workers: true,
        accepts_companies: true,
        has_applied: false,
        applications_count: 0,
        is_new: true,
        is_hot: false,
        created_at: None,
    }
}

pub fn application(id: u64, job: u64, status: ApplicationStatus) -> Application {
    Application {
        id: ApplicationId(id),
        job: JobId(job),
        job_title: None,
        applicant: ME,
        applicant_name: Some("Sam Rivera".to_string()),
        role_name: None,
        status,
        cover_letter: String::new(),
        created_at: Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
        updated_at: None,
    }
}

pub fn worker(id: u64, name: &str, trade: &str) -> WorkerProfile {
    WorkerProfile {
        id: UserId(id),
        name: name.to_string(),
        kind: AccountKind::Individual,
        trade: Some(trade.to_string()),
        skills: vec![trade.to_string()],
        location: Some("Denver".to_string()),
        hourly_rate: Some(38.0),
        rating: Some(4.7),
    }
}

pub fn conversation(id: u64, other: u64) -> Conversation {
    Conversation {
        id: ConversationId(id),
        other_party: OtherParty {
            id: UserId(other),
            name: format!("user-{other}"),
            kind: AccountKind::Company,
        },
        last_message: None,
        unread_count: 0,
        updated_at: None,
    }
}

pub fn message(id: u64, conversation: u64, sender: u64, content: &str) -> Message {
    Message {
        id: MessageId(id),
        conversation: ConversationId(conversation),
        sender: Sender {
            id: UserId(sender),
            name: format!("user-{sender}"),
        },
        content: content.to_string(),
        created_at: Utc
            .with_ymd_and_hms(2025, 3, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp"),
        is_read: false,
    }
}

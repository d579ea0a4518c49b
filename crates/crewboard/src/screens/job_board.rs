use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::Session;
use crate::api::{ApiError, ApplyRequest, MarketplaceApi};
use crate::domain::{AccountKind, Application, Job, JobFilters, JobId, Page};
use crate::listing::{CommitOutcome, PageLoader, PagedFeed};
use crate::sync::{MarketplaceSync, SyncError};

/// What tapping "apply" on a job should do, decided without a network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyPlan {
    /// Already applied; the button is disabled.
    AlreadyApplied,
    /// Individual worker on a multi-role job: ask which role first.
    PickRole(Vec<String>),
    Submit { role_name: Option<String> },
}

pub fn plan_application(
    job: &Job,
    account: Option<AccountKind>,
    role_name: Option<&str>,
) -> ApplyPlan {
    if job.has_applied {
        return ApplyPlan::AlreadyApplied;
    }

    let chosen = role_name
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_string);

    if chosen.is_some() || account == Some(AccountKind::Company) {
        return ApplyPlan::Submit { role_name: chosen };
    }

    match job.roles.as_slice() {
        [] => ApplyPlan::Submit { role_name: None },
        [only] => ApplyPlan::Submit {
            role_name: Some(only.role_name.clone()),
        },
        _ => ApplyPlan::PickRole(job.role_names()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(Application),
    AlreadyApplied,
    /// An application for this job is already being submitted.
    InFlight,
    PickRole(Vec<String>),
}

struct JobsLoader {
    api: Arc<dyn MarketplaceApi>,
    token: Option<String>,
}

#[async_trait]
impl PageLoader<Job, JobFilters> for JobsLoader {
    async fn load(&self, filters: &JobFilters, page: u32) -> Result<Page<Job>, ApiError> {
        self.api.list_jobs(self.token.as_deref(), filters, page).await
    }
}

/// Removes the job from the in-flight set when the submission finishes or is dropped.
struct Submitting {
    applying: Arc<Mutex<HashSet<JobId>>>,
    job_id: JobId,
}

impl Drop for Submitting {
    fn drop(&mut self) {
        if let Ok(mut applying) = self.applying.lock() {
            applying.remove(&self.job_id);
        }
    }
}

/// The jobs list screen: paginated results in local state, patched in place after applying.
///
/// The patched list is independent of the query cache. Until the next refresh the two can
/// disagree about `has_applied`/`applications_count` for a job.
#[derive(Clone)]
pub struct JobBoard {
    sync: MarketplaceSync,
    session: Session,
    feed: PagedFeed<Job, JobFilters>,
    applying: Arc<Mutex<HashSet<JobId>>>,
}

impl JobBoard {
    pub fn new(sync: MarketplaceSync, session: Session) -> Self {
        let loader = Arc::new(JobsLoader {
            api: sync.api().clone(),
            token: session.token.clone(),
        });
        Self {
            sync,
            session,
            feed: PagedFeed::new(loader, JobFilters::default()),
            applying: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn feed(&self) -> &PagedFeed<Job, JobFilters> {
        &self.feed
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.feed.items()
    }

    pub async fn search(&self, filters: JobFilters) -> CommitOutcome {
        self.feed.refresh(filters).await
    }

    pub async fn load_more(&self) -> Option<CommitOutcome> {
        self.feed.load_more().await
    }

    pub fn is_applying(&self, job_id: JobId) -> bool {
        self.applying
            .lock()
            .map(|applying| applying.contains(&job_id))
            .unwrap_or(false)
    }

    /// Whether the apply button for `job` is enabled.
    pub fn can_apply(&self, job: &Job) -> bool {
        self.session.token.is_some() && !job.has_applied && !self.is_applying(job.id)
    }

    pub async fn apply(
        &self,
        job_id: JobId,
        role_name: Option<&str>,
        cover_letter: &str,
    ) -> Result<ApplyOutcome, SyncError> {
        let job = match self.feed.find(|job| job.id == job_id) {
            Some(job) => job,
            None => {
                let state = self.sync.job(self.session.token(), job_id).await;
                match (state.data, state.error) {
                    (Some(job), _) => Job::clone(&job),
                    (None, Some(error)) => return Err(error.into()),
                    (None, None) => return Err(SyncError::Api(ApiError::http(404, None))),
                }
            }
        };

        let role_name = match plan_application(&job, self.session.account, role_name) {
            ApplyPlan::AlreadyApplied => return Ok(ApplyOutcome::AlreadyApplied),
            ApplyPlan::PickRole(roles) => {
                debug!(%job_id, roles = roles.len(), "role selection required");
                return Ok(ApplyOutcome::PickRole(roles));
            }
            ApplyPlan::Submit { role_name } => role_name,
        };

        let Some(_submitting) = self.start_submitting(job_id) else {
            return Ok(ApplyOutcome::InFlight);
        };

        let request = ApplyRequest {
            cover_letter: cover_letter.trim().to_string(),
            role_name,
        };
        let application = self
            .sync
            .apply_to_job(self.session.token(), job_id, &request)
            .await?;

        self.feed.patch_where(
            |job| job.id == job_id,
            |job| {
                job.has_applied = true;
                job.applications_count += 1;
            },
        );
        Ok(ApplyOutcome::Applied(application))
    }

    fn start_submitting(&self, job_id: JobId) -> Option<Submitting> {
        let mut applying = self.applying.lock().ok()?;
        if !applying.insert(job_id) {
            return None;
        }
        Some(Submitting {
            applying: self.applying.clone(),
            job_id,
        })
    }
}

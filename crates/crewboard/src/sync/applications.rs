use tracing::{info, warn};

use super::{keys, require_token, MarketplaceSync, SyncError};
use crate::domain::{Ack, Application, ApplicationId, ApplicationStatus, JobId, Page};
use crate::query::{KeyFilter, QueryState};

impl MarketplaceSync {
    /// The signed-in applicant's applications, optionally narrowed to one status.
    pub async fn my_applications(
        &self,
        token: Option<&str>,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> QueryState<Page<Application>> {
        self.authed_read(
            keys::my_applications(status, page),
            token,
            move |api, token| async move { api.my_applications(&token, status, page).await },
        )
        .await
    }

    /// Applications received for one of the employer's jobs.
    pub async fn job_applications(
        &self,
        token: Option<&str>,
        job_id: JobId,
        status: Option<ApplicationStatus>,
        page: u32,
    ) -> QueryState<Page<Application>> {
        self.authed_read(
            keys::job_applications(job_id, status, page),
            token,
            move |api, token| async move {
                api.job_applications(&token, job_id, status, page).await
            },
        )
        .await
    }

    pub async fn withdraw_application(
        &self,
        token: Option<&str>,
        application_id: ApplicationId,
    ) -> Result<Ack, SyncError> {
        let token = require_token(token)?;
        let ack = self
            .api
            .withdraw_application(&token, application_id)
            .await
            .inspect_err(|error| warn!(%application_id, error = %error, "withdraw failed"))?;

        info!(%application_id, "application withdrawn");
        self.invalidate_all(&[
            KeyFilter::resource(keys::MY_APPLICATIONS),
            KeyFilter::resource(keys::JOB_APPLICATIONS),
        ]);
        Ok(ack)
    }

    /// Employer-side status change. Only the owning job's application lists are invalidated.
    pub async fn update_application_status(
        &self,
        token: Option<&str>,
        job_id: JobId,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, SyncError> {
        let token = require_token(token)?;
        let application = self
            .api
            .update_application_status(&token, application_id, status)
            .await
            .inspect_err(|error| {
                warn!(%application_id, %status, error = %error, "status update failed")
            })?;

        info!(%job_id, %application_id, %status, "application status updated");
        self.invalidate_all(&[keys::applications_for_job(job_id)]);
        Ok(application)
    }
}

use tracing::{info, warn};

use super::{keys, require_token, MarketplaceSync, SyncError};
use crate::api::ApplyRequest;
use crate::domain::{Application, Job, JobId};
use crate::query::{KeyFilter, QueryOptions, QueryState};

impl MarketplaceSync {
    /// Job detail. Public, so it runs with or without a token; the token only personalizes
    /// `has_applied`.
    pub async fn job(&self, token: Option<&str>, job_id: JobId) -> QueryState<Job> {
        let api = self.api.clone();
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        let key = keys::job_detail(job_id, token.is_some());
        let options = QueryOptions::default().stale_time(self.config.stale_time);

        self.cache
            .fetch(key, &options, move || {
                let api = api.clone();
                let token = token.clone();
                async move { api.get_job(token.as_deref(), job_id).await }
            })
            .await
    }

    pub async fn apply_to_job(
        &self,
        token: Option<&str>,
        job_id: JobId,
        request: &ApplyRequest,
    ) -> Result<Application, SyncError> {
        let token = require_token(token)?;
        let application = self
            .api
            .apply_to_job(&token, job_id, request)
            .await
            .inspect_err(|error| warn!(%job_id, error = %error, "application rejected"))?;

        info!(
            %job_id,
            application_id = %application.id,
            role = ?request.role_name,
            "applied to job"
        );
        self.invalidate_all(&[
            KeyFilter::resource(keys::MY_APPLICATIONS),
            keys::applications_for_job(job_id),
            keys::job_detail_of(job_id),
        ]);
        Ok(application)
    }
}

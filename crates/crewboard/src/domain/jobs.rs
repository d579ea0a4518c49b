use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One staffing requirement on a posting, e.g. two electricians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRole {
    pub role_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    OneTime,
    ShortProject,
    LongTerm,
}

impl JobType {
    pub const fn label(self) -> &'static str {
        match self {
            JobType::OneTime => "one_time",
            JobType::ShortProject => "short_project",
            JobType::LongTerm => "long_term",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Fixed,
    Hourly,
    Negotiable,
}

impl PaymentType {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentType::Fixed => "fixed",
            PaymentType::Hourly => "hourly",
            PaymentType::Negotiable => "negotiable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Published,
    Closed,
}

/// Posting as returned by the jobs endpoints. Applicant-facing flags are computed server-side
/// for the requesting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub roles: Vec<JobRole>,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    pub job_type: JobType,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub budget_min: Option<f64>,
    #[serde(default)]
    pub budget_max: Option<f64>,
    pub status: JobStatus,
    #[serde(default = "default_true")]
    pub accepts_individual_workers: bool,
    #[serde(default = "default_true")]
    pub accepts_companies: bool,
    #[serde(default)]
    pub has_applied: bool,
    #[serde(default)]
    pub applications_count: u32,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Job {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|role| role.role_name.clone()).collect()
    }

    pub fn total_positions(&self) -> u32 {
        self.roles.iter().map(|role| role.quantity).sum()
    }

    /// Human readable budget, e.g. `1200-1800`, `from 40`, or `negotiable`.
    pub fn budget_label(&self) -> String {
        match (self.budget_min, self.budget_max) {
            (Some(min), Some(max)) if (min - max).abs() < f64::EPSILON => format!("{min}"),
            (Some(min), Some(max)) => format!("{min}-{max}"),
            (Some(min), None) => format!("from {min}"),
            (None, Some(max)) => format!("up to {max}"),
            (None, None) => "negotiable".to_string(),
        }
    }
}

/// Search filters accepted by `GET /jobs/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub payment_type: Option<PaymentType>,
    pub skills: Vec<String>,
}

impl JobFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = non_blank(&self.search) {
            pairs.push(("search", search));
        }
        if let Some(category) = non_blank(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(location) = non_blank(&self.location) {
            pairs.push(("location", location));
        }
        if let Some(job_type) = self.job_type {
            pairs.push(("job_type", job_type.label().to_string()));
        }
        if let Some(payment_type) = self.payment_type {
            pairs.push(("payment_type", payment_type.label().to_string()));
        }
        if !self.skills.is_empty() {
            pairs.push(("skills", self.skills.join(",")));
        }
        pairs
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_sparse_backend_payload() {
        let job: Job = serde_json::from_value(json!({
            "id": 42,
            "title": "Framing crew",
            "roles": [{"role_name": "Carpenter", "quantity": 3}, {"role_name": "Laborer"}],
            "job_type": "short_project",
            "payment_type": "hourly",
            "status": "published"
        }))
        .expect("job decodes");

        assert_eq!(job.id, JobId(42));
        assert_eq!(job.total_positions(), 4);
        assert!(job.accepts_individual_workers);
        assert!(!job.has_applied);
        assert_eq!(job.budget_label(), "negotiable");
    }

    #[test]
    fn filters_skip_blank_values() {
        let filters = JobFilters {
            search: Some("  ".to_string()),
            location: Some(" Austin ".to_string()),
            job_type: Some(JobType::LongTerm),
            skills: vec!["welding".to_string(), "rigging".to_string()],
            ..JobFilters::default()
        };

        assert_eq!(
            filters.query_pairs(),
            vec![
                ("location", "Austin".to_string()),
                ("job_type", "long_term".to_string()),
                ("skills", "welding,rigging".to_string()),
            ]
        );
    }
}

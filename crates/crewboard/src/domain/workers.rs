use std::fmt;

use serde::{Deserialize, Serialize};

use super::jobs::non_blank;

/// Identifier wrapper for marketplace accounts (workers and companies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Individual,
    Company,
}

impl AccountKind {
    pub const fn label(self) -> &'static str {
        match self {
            AccountKind::Individual => "individual",
            AccountKind::Company => "company",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: UserId,
    pub name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub trade: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub rating: Option<f32>,
}

/// Search filters accepted by `GET /workers/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerFilters {
    pub search: Option<String>,
    pub trade: Option<String>,
    pub location: Option<String>,
    pub kind: Option<AccountKind>,
}

impl WorkerFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = non_blank(&self.search) {
            pairs.push(("search", search));
        }
        if let Some(trade) = non_blank(&self.trade) {
            pairs.push(("trade", trade));
        }
        if let Some(location) = non_blank(&self.location) {
            pairs.push(("location", location));
        }
        if let Some(kind) = self.kind {
            pairs.push(("kind", kind.label().to_string()));
        }
        pairs
    }
}

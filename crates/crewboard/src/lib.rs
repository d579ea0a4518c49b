//! Client-side data synchronization for the Crewboard job marketplace.
//!
//! - [`api`]: the REST boundary ([`api::MarketplaceApi`], [`api::HttpApi`]).
//! - [`query`]: the injectable query cache with de-duplication, staleness, and polling.
//! - [`sync`]: typed queries and invalidating mutations for jobs, applications, and messaging.
//! - [`listing`]: paginated view state guarded against stale responses.
//! - [`screens`]: screen orchestrators (job board, workers, composer, dashboard).

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod listing;
pub mod query;
pub mod screens;
pub mod sync;
pub mod telemetry;

use std::sync::Arc;

use config::ClientConfig;
use error::AppError;

/// Wire the production stack from configuration: HTTP client, fresh cache, sync facade.
pub fn connect(config: &ClientConfig) -> Result<sync::MarketplaceSync, AppError> {
    let api = api::HttpApi::new(config.api.base_url.clone(), config.sync.page_size)?;
    Ok(sync::MarketplaceSync::new(
        Arc::new(api),
        query::QueryCache::new(),
        config.sync.clone(),
    ))
}

//! # Film Funding Backend
//!
//! Serves campaign data, milestone progress and budget allocation
//! rebalancing for the milestone-based film crowdfunding frontend.
//!
//! - **domain**: pure calculators and the services built on them
//! - **storage**: key-value store abstraction used for saved campaigns
//! - **rest**: axum handlers under `/api`
//! - **config**: environment-driven server configuration

pub mod config;
pub mod domain;
pub mod rest;
pub mod storage;

use anyhow::Result;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::CampaignService;
use crate::rest::AppState;
use crate::storage::{InMemoryValueStore, ValueStore};

/// Wire up services for the given configuration
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    let catalog = config.load_catalog()?;
    let value_store: Arc<dyn ValueStore> = Arc::new(InMemoryValueStore::new());
    let campaign_service = CampaignService::new(catalog, value_store.clone());
    Ok(AppState::new(campaign_service, value_store))
}

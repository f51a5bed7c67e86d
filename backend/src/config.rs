//! Server configuration read from the environment.

use anyhow::{bail, Context, Result};
use shared::Campaign;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

pub const BIND_ADDR_VAR: &str = "FILMFUND_BIND_ADDR";
pub const CATALOG_VAR: &str = "FILMFUND_CATALOG";
pub const CORS_ORIGIN_VAR: &str = "FILMFUND_CORS_ORIGIN";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// JSON file with the campaign catalog; an empty catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            catalog_path: None,
            cors_origin: "http://localhost:8080".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("{} is not a socket address: {}", BIND_ADDR_VAR, addr))?;
        }
        if let Some(path) = lookup(CATALOG_VAR).filter(|p| !p.trim().is_empty()) {
            config.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(origin) = lookup(CORS_ORIGIN_VAR) {
            config.cors_origin = origin;
        }

        Ok(config)
    }

    /// Read the campaign catalog, if one is configured
    pub fn load_catalog(&self) -> Result<Vec<Campaign>> {
        let Some(path) = &self.catalog_path else {
            info!("No campaign catalog configured, starting with an empty catalog");
            return Ok(Vec::new());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read campaign catalog {}", path.display()))?;
        let campaigns: Vec<Campaign> = serde_json::from_str(&raw)
            .with_context(|| format!("Campaign catalog {} is not valid", path.display()))?;

        let mut seen = HashSet::new();
        for campaign in &campaigns {
            if !seen.insert(campaign.id.as_str()) {
                bail!("Duplicate campaign id in catalog: {}", campaign.id);
            }
            if !campaign.goal_amount.is_finite() || campaign.goal_amount <= 0.0 {
                bail!(
                    "Catalog campaign {} has a non-positive goal: {}",
                    campaign.id,
                    campaign.goal_amount
                );
            }
        }

        info!("Loaded {} campaigns from {}", campaigns.len(), path.display());
        Ok(campaigns)
    }
}

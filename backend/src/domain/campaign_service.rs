//! Campaign browsing, profile drafts and admin aggregates.
//!
//! The catalog is a read-only list loaded at startup. Campaigns a user
//! creates are kept as JSON arrays in the value store under two keys:
//! `allCampaigns` (shown on the public listing next to the catalog) and
//! `userCampaigns` (shown on the profile page). Both copies are kept in sync
//! on every edit.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::allocation_rebalancer::rebalance;
use crate::domain::models::{generate_campaign_id, CampaignError, CampaignValidationError};
use crate::domain::progress_calculator::compute_progress;
use crate::domain::MilestoneService;
use crate::storage::ValueStore;
use shared::{
    AddMilestoneRequest, AdminCampaignReview, AdminStats, AllocationResponse, AllocationSet, Campaign,
    CreateCampaignRequest, Filmmaker, Milestone, ProductionStatus, ProgressResult, StageSummary,
    UpdateAllocationRequest,
};

/// Store key holding every user-created campaign shown on the listing
pub const ALL_CAMPAIGNS_KEY: &str = "allCampaigns";
/// Store key holding the campaigns shown on the user's profile
pub const USER_CAMPAIGNS_KEY: &str = "userCampaigns";

/// Service for campaign queries and draft editing
#[derive(Clone)]
pub struct CampaignService {
    catalog: Arc<Vec<Campaign>>,
    store: Arc<dyn ValueStore>,
    milestone_service: MilestoneService,
    write_lock: Arc<Mutex<()>>,
}

impl CampaignService {
    /// Create a new CampaignService over a fixed catalog
    pub fn new(catalog: Vec<Campaign>, store: Arc<dyn ValueStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
            milestone_service: MilestoneService::new(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Catalog campaigns followed by saved drafts
    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self.catalog.as_ref().clone();
        campaigns.extend(self.load_list(ALL_CAMPAIGNS_KEY).await?);
        Ok(campaigns)
    }

    pub async fn get_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        if let Some(campaign) = self.catalog.iter().find(|c| c.id == campaign_id) {
            return Ok(Some(campaign.clone()));
        }
        let saved = self.load_list(ALL_CAMPAIGNS_KEY).await?;
        Ok(saved.into_iter().find(|c| c.id == campaign_id))
    }

    /// Case-insensitive match on title or filmmaker name
    pub async fn search_campaigns(&self, term: &str) -> Result<Vec<Campaign>> {
        let term = term.trim().to_lowercase();
        let campaigns = self.list_campaigns().await?;
        if term.is_empty() {
            return Ok(campaigns);
        }

        Ok(campaigns
            .into_iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&term)
                    || c.filmmaker.name.to_lowercase().contains(&term)
            })
            .collect())
    }

    /// Funding progress for a campaign; `None` when the campaign does not exist
    pub async fn campaign_progress(&self, campaign_id: &str) -> Result<Option<ProgressResult>> {
        let Some(campaign) = self.get_campaign(campaign_id).await? else {
            return Ok(None);
        };
        let progress = compute_progress(&campaign.funding(), &campaign.milestones)?;
        Ok(Some(progress))
    }

    pub async fn stage_summary(&self, campaign_id: &str) -> Result<Option<Vec<StageSummary>>> {
        Ok(self
            .get_campaign(campaign_id)
            .await?
            .map(|campaign| self.milestone_service.stage_summary(&campaign)))
    }

    /// Totals shown on the admin dashboard
    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let campaigns = self.list_campaigns().await?;
        let campaign_count = campaigns.len();
        let total_days: u64 = campaigns.iter().map(|c| u64::from(c.days_left)).sum();
        let average_days_left = if campaign_count == 0 {
            0
        } else {
            (total_days as f64 / campaign_count as f64).round() as u32
        };

        Ok(AdminStats {
            campaign_count,
            total_raised: campaigns.iter().map(|c| c.current_amount).sum(),
            total_backers: campaigns.iter().map(|c| u64::from(c.backers)).sum(),
            average_days_left,
        })
    }

    /// Campaigns with their confidential material for the review panel
    pub async fn admin_campaigns(&self, term: Option<&str>) -> Result<Vec<AdminCampaignReview>> {
        let campaigns = match term {
            Some(term) => self.search_campaigns(term).await?,
            None => self.list_campaigns().await?,
        };
        Ok(campaigns.into_iter().map(AdminCampaignReview::from).collect())
    }

    pub async fn admin_campaign(&self, campaign_id: &str) -> Result<Option<AdminCampaignReview>> {
        Ok(self.get_campaign(campaign_id).await?.map(AdminCampaignReview::from))
    }

    /// Create a campaign draft and save it to both campaign lists
    pub async fn create_draft(&self, request: CreateCampaignRequest) -> Result<Campaign> {
        info!("Creating campaign draft: {:?}", request);

        let title = request.title.trim();
        if title.is_empty() {
            return Err(CampaignValidationError::EmptyTitle.into());
        }
        if !request.goal_amount.is_finite() || request.goal_amount <= 0.0 {
            return Err(CampaignValidationError::NonPositiveGoal.into());
        }
        if !request.current_amount.is_finite() || request.current_amount < 0.0 {
            return Err(CampaignValidationError::NegativeCurrentAmount.into());
        }

        let campaign = Campaign {
            id: generate_campaign_id(),
            title: title.to_string(),
            short_description: String::new(),
            description: request.description.trim().to_string(),
            genre: String::new(),
            location: String::new(),
            days_left: request.days_left,
            current_amount: request.current_amount,
            goal_amount: request.goal_amount,
            backers: 0,
            image: String::new(),
            status: ProductionStatus::PreProduction,
            filmmaker: Filmmaker::default(),
            milestones: Vec::new(),
            confidential: None,
            budget_allocation: AllocationSet::default(),
            created_at: Some(Utc::now().to_rfc3339()),
        };

        let _guard = self.write_lock.lock().await;
        // Decode both lists before writing either
        let mut user_campaigns = self.load_list(USER_CAMPAIGNS_KEY).await?;
        let mut all_campaigns = self.load_list(ALL_CAMPAIGNS_KEY).await?;
        user_campaigns.push(campaign.clone());
        all_campaigns.push(campaign.clone());
        self.save_lists(&user_campaigns, &all_campaigns).await?;

        info!("Successfully created campaign draft: {}", campaign.id);
        Ok(campaign)
    }

    /// Drafts listed on the profile page
    pub async fn user_campaigns(&self) -> Result<Vec<Campaign>> {
        self.load_list(USER_CAMPAIGNS_KEY).await
    }

    pub async fn add_milestone(&self, campaign_id: &str, request: AddMilestoneRequest) -> Result<Milestone> {
        let milestone_service = self.milestone_service.clone();
        self.update_draft(campaign_id, move |campaign| {
            Ok(milestone_service.add_milestone(campaign, request)?)
        })
        .await
    }

    pub async fn delete_milestone(&self, campaign_id: &str, milestone_id: &str) -> Result<()> {
        let milestone_service = self.milestone_service.clone();
        self.update_draft(campaign_id, |campaign| {
            if milestone_service.delete_milestone(campaign, milestone_id) {
                Ok(())
            } else {
                Err(CampaignError::MilestoneNotFound(milestone_id.to_string()).into())
            }
        })
        .await
    }

    /// Rebalance the saved budget allocation of a draft
    pub async fn rebalance_allocation(
        &self,
        campaign_id: &str,
        request: UpdateAllocationRequest,
    ) -> Result<AllocationResponse> {
        info!("Rebalancing allocation for {}: {:?}", campaign_id, request);
        self.update_draft(campaign_id, |campaign| {
            let allocation = rebalance(&campaign.budget_allocation, &request.changed_key, request.new_value)?;
            campaign.budget_allocation = allocation.clone();
            Ok(AllocationResponse {
                stage_amounts: allocation.stage_amounts(campaign.goal_amount),
                allocation,
            })
        })
        .await
    }

    /// Apply an edit to a saved draft and write both lists back
    async fn update_draft<T, F>(&self, campaign_id: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Campaign) -> Result<T>,
    {
        if self.catalog.iter().any(|c| c.id == campaign_id) {
            return Err(CampaignError::ReadOnly(campaign_id.to_string()).into());
        }

        let _guard = self.write_lock.lock().await;
        let mut user_campaigns = self.load_list(USER_CAMPAIGNS_KEY).await?;
        let mut all_campaigns = self.load_list(ALL_CAMPAIGNS_KEY).await?;
        let campaign = user_campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| CampaignError::NotFound(campaign_id.to_string()))?;

        let output = edit(campaign)?;
        let updated = campaign.clone();
        match all_campaigns.iter_mut().find(|c| c.id == campaign_id) {
            Some(existing) => *existing = updated,
            None => {
                warn!("Draft {} missing from {}, re-adding it", campaign_id, ALL_CAMPAIGNS_KEY);
                all_campaigns.push(updated);
            }
        }
        self.save_lists(&user_campaigns, &all_campaigns).await?;

        Ok(output)
    }

    /// Write both draft lists, encoding them up front
    async fn save_lists(&self, user_campaigns: &[Campaign], all_campaigns: &[Campaign]) -> Result<()> {
        let user_raw = serde_json::to_string(user_campaigns)?;
        let all_raw = serde_json::to_string(all_campaigns)?;
        self.store.put_value(USER_CAMPAIGNS_KEY, &user_raw).await?;
        self.store.put_value(ALL_CAMPAIGNS_KEY, &all_raw).await
    }

    async fn load_list(&self, key: &str) -> Result<Vec<Campaign>> {
        match self.store.get_value(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Stored value for '{}' is not a campaign list", key)),
            None => Ok(Vec::new()),
        }
    }
}

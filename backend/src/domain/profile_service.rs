//! The filmmaker's profile page.
//!
//! The profile record lives in the value store under `userProfile`. The
//! statistics sidebar is derived from the drafts on the profile list.

use anyhow::{Context, Result};
use chrono::Utc;
use shared::{Campaign, ProfileResponse, ProfileStats, UpdateProfileRequest, UserProfile};
use std::sync::Arc;
use tracing::info;

use crate::domain::models::ProfileValidationError;
use crate::domain::CampaignService;
use crate::storage::ValueStore;

/// Store key holding the serialized profile
pub const PROFILE_KEY: &str = "userProfile";

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ValueStore>,
    campaign_service: CampaignService,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ValueStore>, campaign_service: CampaignService) -> Self {
        Self {
            store,
            campaign_service,
        }
    }

    /// Saved profile, or an empty one before the first edit
    pub async fn get_profile(&self) -> Result<UserProfile> {
        match self.store.get_value(PROFILE_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Stored value for '{}' is not a profile", PROFILE_KEY)),
            None => Ok(UserProfile::default()),
        }
    }

    /// Apply the Edit Profile form
    pub async fn update_profile(&self, request: UpdateProfileRequest) -> Result<UserProfile> {
        info!("Updating profile: {:?}", request);

        let full_name = request.full_name.trim();
        if full_name.is_empty() {
            return Err(ProfileValidationError::EmptyFullName.into());
        }

        let mut profile = self.get_profile().await?;
        profile.full_name = full_name.to_string();
        profile.bio = request.bio.trim().to_string();
        profile.location = request.location.trim().to_string();
        profile.website = request.website.trim().to_string();
        if profile.member_since.is_empty() {
            profile.member_since = Utc::now().format("%B %Y").to_string();
        }

        let raw = serde_json::to_string(&profile)?;
        self.store.put_value(PROFILE_KEY, &raw).await?;

        info!("Successfully updated profile for {}", profile.full_name);
        Ok(profile)
    }

    pub async fn profile_stats(&self) -> Result<ProfileStats> {
        let campaigns = self.campaign_service.user_campaigns().await?;
        Ok(stats_for(&campaigns))
    }

    /// Profile together with its statistics sidebar
    pub async fn profile(&self) -> Result<ProfileResponse> {
        Ok(ProfileResponse {
            profile: self.get_profile().await?,
            stats: self.profile_stats().await?,
        })
    }
}

fn stats_for(campaigns: &[Campaign]) -> ProfileStats {
    ProfileStats {
        project_count: campaigns.len(),
        total_raised: campaigns.iter().map(|c| c.current_amount).sum(),
        total_backers: campaigns.iter().map(|c| u64::from(c.backers)).sum(),
    }
}

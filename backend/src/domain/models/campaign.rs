use uuid::Uuid;

/// Prefix-tagged identifier for a user-created campaign
pub fn generate_campaign_id() -> String {
    format!("campaign::{}", Uuid::new_v4())
}

/// Prefix-tagged identifier for a planned milestone
pub fn generate_milestone_id() -> String {
    format!("milestone::{}", Uuid::new_v4())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CampaignValidationError {
    #[error("Campaign title cannot be empty")]
    EmptyTitle,
    #[error("Goal amount must be positive")]
    NonPositiveGoal,
    #[error("Current amount cannot be negative")]
    NegativeCurrentAmount,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MilestoneValidationError {
    #[error("Milestone title cannot be empty")]
    EmptyTitle,
    #[error("Milestone amount must be positive")]
    NonPositiveAmount,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CampaignError {
    #[error("Campaign not found: {0}")]
    NotFound(String),
    #[error("Campaign {0} is part of the catalog and cannot be edited")]
    ReadOnly(String),
    #[error("Milestone not found: {0}")]
    MilestoneNotFound(String),
}

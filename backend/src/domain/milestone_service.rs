//! Milestone planning for campaign drafts.
//!
//! Filmmakers attach milestones to a draft, grouped under the three budget
//! stages, and compare what they planned against what the budget allocation
//! sets aside for each stage.

use shared::{AddMilestoneRequest, BudgetStage, Campaign, Milestone, MilestoneStatus, StageSummary};
use tracing::info;

use crate::domain::models::{generate_milestone_id, MilestoneValidationError};

#[derive(Clone, Default)]
pub struct MilestoneService;

impl MilestoneService {
    pub fn new() -> Self {
        Self
    }

    /// Validate and append a new upcoming milestone
    pub fn add_milestone(
        &self,
        campaign: &mut Campaign,
        request: AddMilestoneRequest,
    ) -> Result<Milestone, MilestoneValidationError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(MilestoneValidationError::EmptyTitle);
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(MilestoneValidationError::NonPositiveAmount);
        }

        let milestone = Milestone {
            id: generate_milestone_id(),
            title: title.to_string(),
            amount: request.amount,
            status: MilestoneStatus::Upcoming,
            description: request.description.trim().to_string(),
            deliverable: String::new(),
            stage: Some(request.stage),
        };

        info!(
            "Adding milestone '{}' ({}, ${:.2}) to campaign {}",
            milestone.title, request.stage, milestone.amount, campaign.id
        );
        campaign.milestones.push(milestone.clone());
        Ok(milestone)
    }

    /// Remove a milestone by id; returns false when it does not exist
    pub fn delete_milestone(&self, campaign: &mut Campaign, milestone_id: &str) -> bool {
        let before = campaign.milestones.len();
        campaign.milestones.retain(|m| m.id != milestone_id);
        let removed = campaign.milestones.len() != before;
        if removed {
            info!("Deleted milestone {} from campaign {}", milestone_id, campaign.id);
        }
        removed
    }

    pub fn milestones_for_stage<'a>(&self, campaign: &'a Campaign, stage: BudgetStage) -> Vec<&'a Milestone> {
        campaign
            .milestones
            .iter()
            .filter(|m| m.stage == Some(stage))
            .collect()
    }

    /// Allocation and planned milestone totals for every budget stage
    pub fn stage_summary(&self, campaign: &Campaign) -> Vec<StageSummary> {
        let allocation = &campaign.budget_allocation;
        BudgetStage::all()
            .into_iter()
            .map(|stage| {
                let planned = self.milestones_for_stage(campaign, stage);
                StageSummary {
                    stage,
                    percentage: allocation.get(stage.key()).unwrap_or(0.0),
                    allocated_amount: allocation
                        .stage_amount(stage.key(), campaign.goal_amount)
                        .unwrap_or(0.0),
                    milestone_count: planned.len(),
                    milestone_total: planned.iter().map(|m| m.amount).sum(),
                }
            })
            .collect()
    }
}

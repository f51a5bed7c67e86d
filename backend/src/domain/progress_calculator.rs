//! Funding progress calculations for the milestone status bar.
//!
//! Converts a funding state and an ordered list of milestones into the
//! numbers a progress bar needs: the funded percentage, each marker's
//! horizontal position and whether the marker has been reached.
//!
//! ## Rules
//!
//! - The goal must be strictly positive; anything else is rejected
//! - Negative current amounts are treated as zero
//! - The overall percentage is capped at 100, marker positions are not
//! - A milestone is reached when the current amount is at or above it
//! - Markers keep the input order; unordered amounts are accepted as-is

use shared::{FundingState, Milestone, MilestoneMarker, ProgressResult};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProgressError {
    #[error("Goal amount must be positive, got {goal_amount}")]
    InvalidGoal { goal_amount: f64 },
}

/// Compute overall progress and milestone markers for a campaign
pub fn compute_progress(
    funding: &FundingState,
    milestones: &[Milestone],
) -> Result<ProgressResult, ProgressError> {
    let goal_amount = funding.goal_amount;
    if !goal_amount.is_finite() || goal_amount <= 0.0 {
        return Err(ProgressError::InvalidGoal { goal_amount });
    }

    // f64::max drops NaN in favour of the other operand
    let current_amount = funding.current_amount.max(0.0);
    let overall_percentage = (current_amount / goal_amount * 100.0).min(100.0);

    let markers: Vec<MilestoneMarker> = milestones
        .iter()
        .map(|milestone| MilestoneMarker {
            id: milestone.id.clone(),
            title: milestone.title.clone(),
            amount: milestone.amount,
            position: milestone.amount / goal_amount * 100.0,
            reached: current_amount >= milestone.amount,
            status: milestone.status,
        })
        .collect();

    debug!(
        "Progress {:.2}% ({} of {} markers reached)",
        overall_percentage,
        markers.iter().filter(|m| m.reached).count(),
        markers.len()
    );

    Ok(ProgressResult {
        overall_percentage,
        current_amount,
        goal_amount,
        amount_remaining: (goal_amount - current_amount).max(0.0),
        markers,
    })
}

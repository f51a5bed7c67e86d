use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sum every allocation set must reach
pub const ALLOCATION_TOTAL: f64 = 100.0;

/// Numeric tolerance used when checking the allocation total
pub const ALLOCATION_TOLERANCE: f64 = 1e-6;

/// Status of a milestone as published by the campaign owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Completed,
    Current,
    Upcoming,
}

/// Budget phase a milestone or allocation share belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStage {
    PreProduction,
    Production,
    PostProduction,
}

impl BudgetStage {
    /// Allocation category name used for this stage
    pub fn key(&self) -> &'static str {
        match self {
            BudgetStage::PreProduction => "pre-production",
            BudgetStage::Production => "production",
            BudgetStage::PostProduction => "post-production",
        }
    }

    /// All stages in production order
    pub fn all() -> [BudgetStage; 3] {
        [
            BudgetStage::PreProduction,
            BudgetStage::Production,
            BudgetStage::PostProduction,
        ]
    }
}

impl fmt::Display for BudgetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A funding threshold tied to a deliverable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    /// Funding amount at which this milestone is reached
    pub amount: f64,
    pub status: MilestoneStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deliverable: String,
    /// Budget stage this milestone was planned under (drafts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<BudgetStage>,
}

/// Current funding against the campaign goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingState {
    pub current_amount: f64,
    pub goal_amount: f64,
}

/// Display data for a single milestone marker on the progress bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneMarker {
    pub id: String,
    pub title: String,
    pub amount: f64,
    /// Horizontal position as a percentage of the goal; may exceed 100
    pub position: f64,
    pub reached: bool,
    pub status: MilestoneStatus,
}

/// Result of a progress computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResult {
    /// Funded percentage in the range 0..=100
    pub overall_percentage: f64,
    /// Current amount after clamping negatives to zero
    pub current_amount: f64,
    pub goal_amount: f64,
    pub amount_remaining: f64,
    /// Markers in the same order as the input milestones
    pub markers: Vec<MilestoneMarker>,
}

impl ProgressResult {
    /// IDs of all reached milestones, in input order
    pub fn reached_ids(&self) -> Vec<&str> {
        self.markers
            .iter()
            .filter(|m| m.reached)
            .map(|m| m.id.as_str())
            .collect()
    }

    /// First milestone that has not been reached yet
    pub fn next_milestone(&self) -> Option<&MilestoneMarker> {
        self.markers.iter().find(|m| !m.reached)
    }

    /// Label shown under the campaign funding bar, e.g. "53% funded"
    pub fn funded_label(&self) -> String {
        format!("{}% funded", self.overall_percentage.round() as u32)
    }
}

/// Budget percentages keyed by category name.
///
/// Shares are non-negative, finite and sum to [`ALLOCATION_TOTAL`] within
/// [`ALLOCATION_TOLERANCE`]. The invariant is checked on construction and on
/// deserialization, so every value of this type satisfies it. Keys iterate in
/// lexicographic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct AllocationSet {
    shares: BTreeMap<String, f64>,
}

impl AllocationSet {
    /// Build a validated allocation set
    pub fn new<I, K>(shares: I) -> Result<Self, AllocationSetError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let shares: BTreeMap<String, f64> = shares
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();

        if shares.is_empty() {
            return Err(AllocationSetError::Empty);
        }

        for (key, value) in &shares {
            if !value.is_finite() {
                return Err(AllocationSetError::NonFiniteShare(key.clone()));
            }
            if *value < 0.0 {
                return Err(AllocationSetError::NegativeShare(key.clone()));
            }
        }

        let total: f64 = shares.values().sum();
        if (total - ALLOCATION_TOTAL).abs() > ALLOCATION_TOLERANCE {
            return Err(AllocationSetError::InvalidTotal(total));
        }

        Ok(Self { shares })
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.shares.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.shares.contains_key(key)
    }

    /// Category names in lexicographic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.shares.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.shares.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Whole-dollar amount of `total_budget` assigned to a category
    pub fn stage_amount(&self, key: &str, total_budget: f64) -> Option<f64> {
        self.get(key)
            .map(|share| (total_budget * share / 100.0).round())
    }

    /// Whole-dollar amounts for every category
    pub fn stage_amounts(&self, total_budget: f64) -> BTreeMap<String, f64> {
        self.shares
            .iter()
            .map(|(key, share)| (key.clone(), (total_budget * share / 100.0).round()))
            .collect()
    }
}

impl Default for AllocationSet {
    fn default() -> Self {
        Self {
            shares: BTreeMap::from([
                (BudgetStage::PreProduction.key().to_string(), 30.0),
                (BudgetStage::Production.key().to_string(), 50.0),
                (BudgetStage::PostProduction.key().to_string(), 20.0),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for AllocationSet {
    type Error = AllocationSetError;

    fn try_from(shares: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(shares)
    }
}

impl From<AllocationSet> for BTreeMap<String, f64> {
    fn from(set: AllocationSet) -> Self {
        set.shares
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationSetError {
    Empty,
    NegativeShare(String),
    NonFiniteShare(String),
    InvalidTotal(f64),
}

impl fmt::Display for AllocationSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationSetError::Empty => write!(f, "Allocation set has no categories"),
            AllocationSetError::NegativeShare(key) => {
                write!(f, "Allocation share for '{}' is negative", key)
            }
            AllocationSetError::NonFiniteShare(key) => {
                write!(f, "Allocation share for '{}' is not a finite number", key)
            }
            AllocationSetError::InvalidTotal(total) => {
                write!(f, "Allocation shares sum to {:.6} instead of 100", total)
            }
        }
    }
}

impl std::error::Error for AllocationSetError {}

/// Production phase a campaign is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductionStatus {
    PreProduction,
    PrincipalPhotography,
    PostProduction,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filmmaker {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub previous_works: Vec<String>,
}

/// One line of a campaign's confidential budget breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePhase {
    pub phase: String,
    pub start_date: String, // ISO 8601 date (YYYY-MM-DD)
    pub end_date: String,   // ISO 8601 date (YYYY-MM-DD)
}

/// Material only visible in the admin review panel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidentialInfo {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub budget: Vec<BudgetLine>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub crew: Vec<String>,
    #[serde(default)]
    pub timeline: Vec<TimelinePhase>,
}

/// A film funding campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub location: String,
    pub days_left: u32,
    pub current_amount: f64,
    pub goal_amount: f64,
    #[serde(default)]
    pub backers: u32,
    #[serde(default)]
    pub image: String,
    pub status: ProductionStatus,
    #[serde(default)]
    pub filmmaker: Filmmaker,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidential: Option<ConfidentialInfo>,
    #[serde(default)]
    pub budget_allocation: AllocationSet,
    /// RFC 3339 timestamp, set for user-created drafts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Campaign {
    pub fn funding(&self) -> FundingState {
        FundingState {
            current_amount: self.current_amount,
            goal_amount: self.goal_amount,
        }
    }

    /// Copy for public listings, with the admin-only material removed
    pub fn without_confidential(mut self) -> Self {
        self.confidential = None;
        self
    }

    /// Sum of the confidential budget breakdown, zero when none is attached
    pub fn budget_total(&self) -> f64 {
        self.confidential
            .as_ref()
            .map(|c| c.budget.iter().map(|line| line.amount).sum())
            .unwrap_or(0.0)
    }
}

/// Request for a stateless progress computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeProgressRequest {
    pub funding: FundingState,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// Request for a stateless allocation rebalance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    pub allocation: AllocationSet,
    pub changed_key: String,
    pub new_value: f64,
}

/// Request to change one share of a saved campaign's allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAllocationRequest {
    pub changed_key: String,
    pub new_value: f64,
}

/// Allocation together with the amounts it assigns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub allocation: AllocationSet,
    pub stage_amounts: BTreeMap<String, f64>,
}

/// Request for adding a milestone to a campaign draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMilestoneRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub stage: BudgetStage,
    pub amount: f64,
}

/// Request for creating a campaign draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCampaignRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub goal_amount: f64,
    #[serde(default)]
    pub days_left: u32,
    #[serde(default)]
    pub current_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignListResponse {
    pub campaigns: Vec<Campaign>,
}

/// Aggregates shown at the top of the admin panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub campaign_count: usize,
    pub total_raised: f64,
    pub total_backers: u64,
    pub average_days_left: u32,
}

/// A campaign as shown in the admin review dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCampaignReview {
    pub campaign: Campaign,
    pub budget_total: f64,
}

impl From<Campaign> for AdminCampaignReview {
    fn from(campaign: Campaign) -> Self {
        Self {
            budget_total: campaign.budget_total(),
            campaign,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCampaignListResponse {
    pub campaigns: Vec<AdminCampaignReview>,
}

/// Public profile of the signed-in filmmaker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub avatar: String,
    /// Month and year of the first profile save, e.g. "March 2023"
    #[serde(default)]
    pub member_since: String,
}

/// Fields editable from the Edit Profile dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
}

/// Totals over the filmmaker's own campaigns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    pub project_count: usize,
    pub total_raised: f64,
    pub total_backers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub stats: ProfileStats,
}

/// Planning figures for one budget stage of a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: BudgetStage,
    pub percentage: f64,
    pub allocated_amount: f64,
    pub milestone_count: usize,
    pub milestone_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummaryResponse {
    pub stages: Vec<StageSummary>,
}

/// Raw entry of the client key-value store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

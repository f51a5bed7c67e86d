use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    AddMilestoneRequest, AdminCampaignListResponse, Campaign, CampaignListResponse,
    ComputeProgressRequest, CreateCampaignRequest, KeyValue, RebalanceRequest, StageSummaryResponse,
    UpdateAllocationRequest, UpdateProfileRequest,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::models::{
    CampaignError, CampaignValidationError, MilestoneValidationError, ProfileValidationError,
};
use crate::domain::{
    compute_progress, rebalance, AllocationError, CampaignService, ProfileService, ProgressError,
};
use crate::storage::ValueStore;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub campaign_service: CampaignService,
    pub profile_service: ProfileService,
    pub value_store: Arc<dyn ValueStore>,
}

impl AppState {
    pub fn new(campaign_service: CampaignService, value_store: Arc<dyn ValueStore>) -> Self {
        let profile_service = ProfileService::new(value_store.clone(), campaign_service.clone());
        Self {
            campaign_service,
            profile_service,
            value_store,
        }
    }
}

/// Routes under `/api`
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaigns/:id", get(get_campaign))
        .route("/campaigns/:id/progress", get(get_campaign_progress))
        .route("/campaigns/:id/stages", get(get_stage_summary))
        .route("/campaigns/:id/milestones", post(add_milestone))
        .route("/campaigns/:id/milestones/:milestone_id", delete(delete_milestone))
        .route("/campaigns/:id/allocation", put(update_allocation))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/campaigns", get(list_user_campaigns))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/campaigns", get(list_admin_campaigns))
        .route("/admin/campaigns/:id", get(get_admin_campaign))
        .route("/progress", post(progress))
        .route("/allocations/rebalance", post(rebalance_allocation))
        .route("/values/:key", get(get_value).delete(delete_value))
        .route("/values", post(put_value));

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Map a service error onto a status code
fn error_response(err: anyhow::Error) -> Response {
    let status = if let Some(campaign_err) = err.downcast_ref::<CampaignError>() {
        match campaign_err {
            CampaignError::NotFound(_) | CampaignError::MilestoneNotFound(_) => StatusCode::NOT_FOUND,
            CampaignError::ReadOnly(_) => StatusCode::CONFLICT,
        }
    } else if err.is::<CampaignValidationError>()
        || err.is::<MilestoneValidationError>()
        || err.is::<ProfileValidationError>()
        || err.is::<AllocationError>()
        || err.is::<ProgressError>()
    {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {:?}", err);
        (status, "Internal server error").into_response()
    } else {
        warn!("Request rejected ({}): {}", status, err);
        (status, err.to_string()).into_response()
    }
}

/// Query parameters for the campaign list endpoint
#[derive(Deserialize, Debug)]
pub struct CampaignSearchQuery {
    pub search: Option<String>,
}

/// Axum handler function for GET /api/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<CampaignSearchQuery>,
) -> impl IntoResponse {
    info!("GET /api/campaigns - query: {:?}", query);

    let result = match query.search.as_deref() {
        Some(term) => state.campaign_service.search_campaigns(term).await,
        None => state.campaign_service.list_campaigns().await,
    };

    match result {
        Ok(campaigns) => {
            let campaigns = campaigns.into_iter().map(Campaign::without_confidential).collect();
            (StatusCode::OK, Json(CampaignListResponse { campaigns })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Axum handler function for POST /api/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaignRequest>,
) -> impl IntoResponse {
    info!("POST /api/campaigns - title: {}", request.title);

    match state.campaign_service.create_draft(request).await {
        Ok(campaign) => (StatusCode::CREATED, Json(campaign)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/campaigns/:id
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/campaigns/{}", id);

    match state.campaign_service.get_campaign(&id).await {
        Ok(Some(campaign)) => (StatusCode::OK, Json(campaign.without_confidential())).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Campaign not found").into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/campaigns/:id/progress
pub async fn get_campaign_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/campaigns/{}/progress", id);

    match state.campaign_service.campaign_progress(&id).await {
        Ok(Some(progress)) => (StatusCode::OK, Json(progress)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Campaign not found").into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/campaigns/:id/stages
pub async fn get_stage_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/campaigns/{}/stages", id);

    match state.campaign_service.stage_summary(&id).await {
        Ok(Some(stages)) => (StatusCode::OK, Json(StageSummaryResponse { stages })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Campaign not found").into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for POST /api/campaigns/:id/milestones
pub async fn add_milestone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddMilestoneRequest>,
) -> impl IntoResponse {
    info!("POST /api/campaigns/{}/milestones - request: {:?}", id, request);

    match state.campaign_service.add_milestone(&id, request).await {
        Ok(milestone) => (StatusCode::CREATED, Json(milestone)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for DELETE /api/campaigns/:id/milestones/:milestone_id
pub async fn delete_milestone(
    State(state): State<AppState>,
    Path((id, milestone_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/campaigns/{}/milestones/{}", id, milestone_id);

    match state.campaign_service.delete_milestone(&id, &milestone_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for PUT /api/campaigns/:id/allocation
pub async fn update_allocation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAllocationRequest>,
) -> impl IntoResponse {
    info!("PUT /api/campaigns/{}/allocation - request: {:?}", id, request);

    match state.campaign_service.rebalance_allocation(&id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/profile");

    match state.profile_service.profile().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for PUT /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    info!("PUT /api/profile");

    match state.profile_service.update_profile(request).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/profile/campaigns
pub async fn list_user_campaigns(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/profile/campaigns");

    match state.campaign_service.user_campaigns().await {
        Ok(campaigns) => (StatusCode::OK, Json(CampaignListResponse { campaigns })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/admin/stats
pub async fn admin_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/admin/stats");

    match state.campaign_service.admin_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/admin/campaigns
pub async fn list_admin_campaigns(
    State(state): State<AppState>,
    Query(query): Query<CampaignSearchQuery>,
) -> impl IntoResponse {
    info!("GET /api/admin/campaigns - query: {:?}", query);

    match state.campaign_service.admin_campaigns(query.search.as_deref()).await {
        Ok(campaigns) => (StatusCode::OK, Json(AdminCampaignListResponse { campaigns })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for GET /api/admin/campaigns/:id
pub async fn get_admin_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/admin/campaigns/{}", id);

    match state.campaign_service.admin_campaign(&id).await {
        Ok(Some(review)) => (StatusCode::OK, Json(review)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Campaign not found").into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for POST /api/progress
pub async fn progress(Json(request): Json<ComputeProgressRequest>) -> impl IntoResponse {
    info!("POST /api/progress - {} milestones", request.milestones.len());

    match compute_progress(&request.funding, &request.milestones) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// Axum handler function for POST /api/allocations/rebalance
pub async fn rebalance_allocation(Json(request): Json<RebalanceRequest>) -> impl IntoResponse {
    info!(
        "POST /api/allocations/rebalance - {} -> {}",
        request.changed_key, request.new_value
    );

    match rebalance(&request.allocation, &request.changed_key, request.new_value) {
        Ok(allocation) => (StatusCode::OK, Json(allocation)).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// Axum handler function for GET /api/values/:key
pub async fn get_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/values/{}", key);

    match state.value_store.get_value(&key).await {
        Ok(Some(value)) => (StatusCode::OK, Json(KeyValue { key, value })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Key not found").into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for POST /api/values
pub async fn put_value(
    State(state): State<AppState>,
    Json(kv): Json<KeyValue>,
) -> impl IntoResponse {
    info!("POST /api/values - key: {}", kv.key);

    match state.value_store.put_value(&kv.key, &kv.value).await {
        Ok(()) => (StatusCode::CREATED, Json(kv)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler function for DELETE /api/values/:key
pub async fn delete_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/values/{}", key);

    match state.value_store.delete_value(&key).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Key not found").into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryValueStore;
    use shared::{AllocationSet, FundingState};

    fn setup_test_state() -> AppState {
        let store: Arc<dyn ValueStore> = Arc::new(InMemoryValueStore::new());
        AppState::new(CampaignService::new(Vec::new(), store.clone()), store)
    }

    #[test]
    fn test_error_response_status_codes() {
        let cases: Vec<(anyhow::Error, StatusCode)> = vec![
            (CampaignError::NotFound("x".into()).into(), StatusCode::NOT_FOUND),
            (CampaignError::MilestoneNotFound("m".into()).into(), StatusCode::NOT_FOUND),
            (CampaignError::ReadOnly("x".into()).into(), StatusCode::CONFLICT),
            (CampaignValidationError::EmptyTitle.into(), StatusCode::BAD_REQUEST),
            (MilestoneValidationError::NonPositiveAmount.into(), StatusCode::BAD_REQUEST),
            (ProfileValidationError::EmptyFullName.into(), StatusCode::BAD_REQUEST),
            (AllocationError::UnknownCategory("x".into()).into(), StatusCode::BAD_REQUEST),
            (ProgressError::InvalidGoal { goal_amount: 0.0 }.into(), StatusCode::BAD_REQUEST),
            (anyhow::anyhow!("disk on fire"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(error_response(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_progress_handler() {
        let request = ComputeProgressRequest {
            funding: FundingState { current_amount: 10.0, goal_amount: 0.0 },
            milestones: Vec::new(),
        };
        let response = progress(Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rebalance_handler_unknown_key() {
        let request = RebalanceRequest {
            allocation: AllocationSet::default(),
            changed_key: "marketing".to_string(),
            new_value: 10.0,
        };
        let response = rebalance_allocation(Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_value_handlers() {
        let state = setup_test_state();

        let missing = get_value(State(state.clone()), Path("userCampaigns".to_string()))
            .await
            .into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let kv = KeyValue {
            key: "userCampaigns".to_string(),
            value: "[]".to_string(),
        };
        let created = put_value(State(state.clone()), Json(kv)).await.into_response();
        assert_eq!(created.status(), StatusCode::CREATED);

        let found = get_value(State(state.clone()), Path("userCampaigns".to_string()))
            .await
            .into_response();
        assert_eq!(found.status(), StatusCode::OK);

        let deleted = delete_value(State(state.clone()), Path("userCampaigns".to_string()))
            .await
            .into_response();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let gone = delete_value(State(state), Path("userCampaigns".to_string()))
            .await
            .into_response();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}

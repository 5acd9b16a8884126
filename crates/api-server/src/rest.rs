//! Axum handlers for the admin CRUD API.
//!
//! Mutations answer `{"success": true, "<entity>": …}`; failures surface as
//! `{"error": message}` with 404 for unknown ids and 500 otherwise.

use adpulse_analytics::AnalyticsManager;
use adpulse_core::AdPulseError;
use adpulse_delivery::models::{BannerFilter, CreateBannerRequest, UpdateBannerRequest};
use adpulse_delivery::BannerManager;
use adpulse_management::models::{
    CreateClientRequest, CreatePlacementRequest, CreateCampaignRequest, UpdateClientRequest,
    UpdateCampaignRequest, UpdatePlacementRequest,
};
use adpulse_management::{CampaignManager, ClientManager, PlacementManager};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub banners: Arc<BannerManager>,
    pub placements: Arc<PlacementManager>,
    pub clients: Arc<ClientManager>,
    pub campaigns: Arc<CampaignManager>,
    pub analytics: Arc<AnalyticsManager>,
    pub retention_days: u32,
    pub start_time: Instant,
}

/// Audit identity for admin mutations; the dashboard is single-operator.
pub const ADMIN_USER: &str = "admin";

pub struct ApiError(pub AdPulseError);

impl From<AdPulseError> for ApiError {
    fn from(err: AdPulseError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AdPulseError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

// ─── Health ────────────────────────────────────────────────────────────────

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

// ─── Banners ───────────────────────────────────────────────────────────────

pub async fn list_banners(
    State(state): State<AppState>,
    Query(filter): Query<BannerFilter>,
) -> Json<Value> {
    Json(json!(state.banners.all(&filter)))
}

pub async fn get_banner(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.banners.get(&id)?)))
}

pub async fn create_banner(
    State(state): State<AppState>,
    Json(req): Json<CreateBannerRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let banner = state.banners.create(req, ADMIN_USER)?;
    metrics::counter!("adpulse.banners.created").increment(1);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "banner": banner })),
    ))
}

pub async fn update_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBannerRequest>,
) -> ApiResult {
    let banner = state.banners.update(&id, req, ADMIN_USER)?;
    Ok(Json(json!({ "success": true, "banner": banner })))
}

pub async fn delete_banner(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.banners.delete(&id, ADMIN_USER)?;
    metrics::counter!("adpulse.banners.deleted").increment(1);
    Ok(Json(json!({ "success": true })))
}

pub async fn toggle_banner(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let banner = state.banners.toggle_status(&id, ADMIN_USER)?;
    Ok(Json(json!({ "success": true, "banner": banner })))
}

pub async fn duplicate_banner(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let banner = state.banners.duplicate(&id, ADMIN_USER)?;
    Ok(Json(json!({ "success": true, "banner": banner })))
}

pub async fn banner_revisions(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.banners.revisions(&id)?)))
}

pub async fn banner_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.banners.stats()))
}

// ─── Clients ───────────────────────────────────────────────────────────────

pub async fn list_clients(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.clients.all()))
}

pub async fn get_client(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.clients.get(&id)?)))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let client = state.clients.create(req)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "client": client })),
    ))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateClientRequest>,
) -> ApiResult {
    let client = state.clients.update(&id, req)?;
    Ok(Json(json!({ "success": true, "client": client })))
}

pub async fn delete_client(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.clients.delete(&id)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn client_banners(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    Json(json!(state.clients.banners(&id)))
}

pub async fn client_campaigns(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    Json(json!(state.clients.campaigns(&id)))
}

pub async fn client_stats(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.clients.stats(&id)?)))
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.campaigns.all()))
}

pub async fn get_campaign(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.campaigns.get(&id)?)))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let campaign = state.campaigns.create(req)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "campaign": campaign })),
    ))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult {
    let campaign = state.campaigns.update(&id, req)?;
    Ok(Json(json!({ "success": true, "campaign": campaign })))
}

pub async fn delete_campaign(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.campaigns.delete(&id)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn campaign_banners(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    Json(json!(state.campaigns.banners(&id)))
}

pub async fn campaign_stats(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.campaigns.stats(&id)?)))
}

// ─── Placements ────────────────────────────────────────────────────────────

pub async fn list_placements(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.placements.all()))
}

pub async fn get_placement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.placements.get(&id)?)))
}

pub async fn create_placement(
    State(state): State<AppState>,
    Json(req): Json<CreatePlacementRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let placement = state.placements.create(req)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "placement": placement })),
    ))
}

pub async fn update_placement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlacementRequest>,
) -> ApiResult {
    let placement = state.placements.update(&id, req)?;
    Ok(Json(json!({ "success": true, "placement": placement })))
}

pub async fn delete_placement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.placements.delete(&id)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn toggle_placement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let placement = state.placements.toggle(&id)?;
    Ok(Json(json!({ "success": true, "placement": placement })))
}

pub async fn placement_banners(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    Json(json!(state.placements.banners_for(&id)))
}

pub async fn placement_stats(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(json!(state.placements.stats(&id)?)))
}

pub async fn all_placement_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.placements.stats_all()))
}

pub async fn placement_embed(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let placement = state.placements.get(&id)?;
    Ok(Json(
        json!({ "code": PlacementManager::embed_code(&placement) }),
    ))
}

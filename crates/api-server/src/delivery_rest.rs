//! Public delivery and tracking endpoints, plus audit and maintenance.

use crate::rest::{ApiError, AppState};
use adpulse_analytics::RecordEventRequest;
use adpulse_core::types::{DeviceTarget, PageType};
use adpulse_core::AdPulseResult;
use adpulse_delivery::models::AuditLogFilter;
use adpulse_delivery::{build_utm_url, DeliveryBanner, DeliveryContext};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

const SESSION_COOKIE: &str = "ap_session";
const DEFAULT_AUDIT_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverQuery {
    #[serde(default)]
    pub device: Option<DeviceTarget>,
    #[serde(default)]
    pub page_type: Option<PageType>,
}

/// `GET /api/deliver/:placementId` — the page-render request. Runs the
/// status sweep first so scheduled/expired banners are current, then
/// filters, rotates, and maps to the delivery payload.
pub async fn deliver(
    State(state): State<AppState>,
    Path(placement_id): Path<String>,
    Query(query): Query<DeliverQuery>,
) -> Json<Value> {
    if let Err(err) = state.banners.update_statuses() {
        warn!(error = %err, "Status sweep failed; delivering with stale statuses");
    }

    let ctx = DeliveryContext {
        device: query.device.or(Some(DeviceTarget::Desktop)),
        page_type: query.page_type.or(Some(PageType::Homepage)),
    };
    let banners: Vec<DeliveryBanner> = state
        .banners
        .active_banners_for_placement(&placement_id, &ctx)
        .iter()
        .map(DeliveryBanner::from_banner)
        .collect();
    metrics::counter!("adpulse.delivery.requests").increment(1);

    Json(json!({ "placementId": placement_id, "banners": banners }))
}

/// `POST /api/track/impression` — page URL falls back to the Referer
/// header, the session id to the site cookie.
pub async fn track_impression(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut req): Json<RecordEventRequest>,
) -> Result<Json<Value>, ApiError> {
    apply_request_context(&mut req, &headers);
    state.analytics.record_impression(req)?;
    metrics::counter!("adpulse.track.impressions").increment(1);
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/track/click`
pub async fn track_click(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut req): Json<RecordEventRequest>,
) -> Result<Json<Value>, ApiError> {
    apply_request_context(&mut req, &headers);
    state.analytics.record_click(req)?;
    metrics::counter!("adpulse.track.clicks").increment(1);
    Ok(Json(json!({ "success": true })))
}

/// `GET /click/:bannerId` — record the click, then send the visitor to the
/// UTM-built target. Any failure, including an unknown banner, falls back
/// to the site root rather than an error page.
pub async fn click_redirect(
    State(state): State<AppState>,
    Path(banner_id): Path<String>,
    headers: HeaderMap,
) -> Redirect {
    match resolve_click(&state, &banner_id, &headers) {
        Ok(url) if !url.is_empty() => Redirect::temporary(&url),
        Ok(_) => Redirect::temporary("/"),
        Err(err) => {
            warn!(banner_id = %banner_id, error = %err, "Click redirect failed");
            Redirect::temporary("/")
        }
    }
}

fn resolve_click(state: &AppState, banner_id: &str, headers: &HeaderMap) -> AdPulseResult<String> {
    let banner = state.banners.get(banner_id)?;
    state.analytics.record_click(RecordEventRequest {
        banner_id: banner.id.clone(),
        client_id: banner.client_id.clone(),
        campaign_id: banner.campaign_id.clone(),
        page_url: header_value(headers, header::REFERER).unwrap_or_default(),
        target_url: banner.click.target_url.clone(),
        user_agent: header_value(headers, header::USER_AGENT).unwrap_or_default(),
        ..Default::default()
    })?;
    Ok(build_utm_url(&banner))
}

/// `GET /api/audit-log`
pub async fn audit_log(
    State(state): State<AppState>,
    Query(mut filter): Query<AuditLogFilter>,
) -> Json<Value> {
    filter.limit = Some(filter.limit.unwrap_or(DEFAULT_AUDIT_LIMIT));
    Json(json!(state.banners.audit_log(&filter)))
}

// ─── Maintenance ───────────────────────────────────────────────────────────

/// `POST /api/maintenance/sweep` — external cron trigger for the status
/// sweep.
pub async fn maintenance_sweep(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let transitioned = state.banners.update_statuses()?;
    Ok(Json(json!({ "success": true, "transitioned": transitioned })))
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

/// `POST /api/maintenance/cleanup?days=` — retention cleanup, defaulting to
/// the configured horizon.
pub async fn maintenance_cleanup(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = query.days.unwrap_or(state.retention_days);
    let report = state.analytics.cleanup_old_data(days)?;
    Ok(Json(json!({ "success": true, "cleanup": report })))
}

// ─── Helpers ───────────────────────────────────────────────────────────────

fn apply_request_context(req: &mut RecordEventRequest, headers: &HeaderMap) {
    if req.page_url.is_empty() {
        req.page_url = header_value(headers, header::REFERER).unwrap_or_default();
    }
    if req.user_agent.is_empty() {
        req.user_agent = header_value(headers, header::USER_AGENT).unwrap_or_default();
    }
    if req.session_id.is_empty() {
        req.session_id = cookie_value(headers, SESSION_COOKIE).unwrap_or_default();
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

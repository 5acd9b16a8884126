//! Analytics reporting endpoints.

use crate::rest::{ApiError, AppState};
use adpulse_analytics::ReportType;
use adpulse_core::documents::date_key;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// `start`/`end` query window, defaulting to the trailing 30 days.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl RangeQuery {
    fn resolve(self) -> (String, String) {
        let now = Utc::now();
        let start = self
            .start
            .unwrap_or_else(|| date_key(now - Duration::days(30)));
        let end = self.end.unwrap_or_else(|| date_key(now));
        (start, end)
    }
}

/// `GET /api/analytics/summary`
pub async fn summary(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.analytics.dashboard_summary()))
}

/// `GET /api/analytics/banner/:id`
pub async fn banner_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Value>, ApiError> {
    let (start, end) = range.resolve();
    Ok(Json(json!(state.analytics.banner_report(&id, &start, &end)?)))
}

/// `GET /api/analytics/placement/:id`
pub async fn placement_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Value>, ApiError> {
    let (start, end) = range.resolve();
    Ok(Json(json!(state
        .analytics
        .placement_report(&id, &start, &end)?)))
}

/// `GET /api/analytics/client/:id`
pub async fn client_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Value>, ApiError> {
    let (start, end) = range.resolve();
    Ok(Json(json!(state.analytics.client_report(&id, &start, &end)?)))
}

/// `GET /api/analytics/export/:type/:id` — CSV download.
pub async fn export_csv(
    State(state): State<AppState>,
    Path((report_type, id)): Path<(String, String)>,
    Query(range): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report_type: ReportType = report_type.parse()?;
    let (start, end) = range.resolve();
    let csv = state.analytics.export_csv(report_type, &id, &start, &end)?;
    let filename = format!("adpulse-{id}-{start}-{end}.csv");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

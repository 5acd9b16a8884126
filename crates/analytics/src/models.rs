//! Request and report types for the analytics manager.

use adpulse_core::types::{Banner, Client, Placement};
use adpulse_core::AdPulseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Payload accepted by both impression and click tracking. Click tracking
/// reads `target_url`; impression tracking reads `page_type`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    pub banner_id: String,
    #[serde(default)]
    pub placement_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub page_url: String,
    #[serde(default)]
    pub page_type: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub viewport: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSeries {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: String,
    /// Chronological, oldest day first.
    pub daily: Vec<DailyPoint>,
}

/// A banner joined with its lifetime performance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPerformance {
    pub id: String,
    pub banner: Banner,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub today: WindowTotals,
    pub week: WindowSeries,
    pub month: WindowSeries,
    /// Top 5 banners by lifetime impressions.
    pub top_banners: Vec<BannerPerformance>,
    /// Active banners ending within 7 days, soonest first.
    pub expiring_banners: Vec<Banner>,
    /// Active banners with >100 impressions and CTR below 0.5%, worst first.
    pub underperforming_banners: Vec<BannerPerformance>,
    pub active_banners: usize,
    pub total_banners: usize,
    pub total_clients: usize,
    pub total_placements: usize,
}

#[derive(Debug, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerReport {
    pub banner: Banner,
    pub period: Period,
    pub totals: ReportTotals,
    pub daily: Vec<DailyPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub placement: Placement,
    pub period: Period,
    pub totals: ReportTotals,
    pub daily: Vec<DailyPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBannerPerformance {
    pub banner: Banner,
    pub period_impressions: u64,
    pub period_clicks: u64,
    pub period_ctr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReport {
    pub client: Client,
    pub period: Period,
    pub totals: ReportTotals,
    pub daily: Vec<DailyPoint>,
    /// Per-banner performance over the same window.
    pub banners: Vec<ClientBannerPerformance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Banner,
    Placement,
    Client,
}

impl FromStr for ReportType {
    type Err = AdPulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "banner" => Ok(ReportType::Banner),
            "placement" => Ok(ReportType::Placement),
            "client" => Ok(ReportType::Client),
            other => Err(AdPulseError::Unsupported(format!(
                "unknown report type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub cutoff_date: String,
    pub removed_days: usize,
    pub removed_events: usize,
}

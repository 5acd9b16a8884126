//! Request and stats types for the management managers.

use adpulse_core::types::*;
use serde::{Deserialize, Serialize};

// ─── Clients ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact: ContactPerson,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub tier: ClientTier,
    #[serde(default)]
    pub billing: Billing,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact: Option<ContactPerson>,
    pub status: Option<ClientStatus>,
    pub tier: Option<ClientTier>,
    pub billing: Option<Billing>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub total_banners: usize,
    pub active_banners: usize,
    pub paused_banners: usize,
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub ctr: String,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    pub client_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub budget_type: BudgetType,
    #[serde(default)]
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub impression_goal: Option<u64>,
    #[serde(default)]
    pub click_goal: Option<u64>,
    #[serde(default = "default_page_targeting")]
    pub default_page_targeting: Vec<PageType>,
    #[serde(default)]
    pub default_device_targeting: DeviceTarget,
}

fn default_page_targeting() -> Vec<PageType> {
    vec![PageType::All]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
    pub budget: Option<f64>,
    pub budget_type: Option<BudgetType>,
    pub spent_amount: Option<f64>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub impression_goal: Option<u64>,
    pub click_goal: Option<u64>,
    pub default_page_targeting: Option<Vec<PageType>>,
    pub default_device_targeting: Option<DeviceTarget>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    pub campaign: Campaign,
    pub total_banners: usize,
    pub active_banners: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub ctr: String,
    /// Percent of the impression goal reached, when a goal is set.
    pub impression_progress: Option<String>,
    pub click_progress: Option<String>,
}

// ─── Placements ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlacementRequest {
    /// Callers may supply a stable, human-readable id; one is generated
    /// otherwise.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub css_selector: String,
    #[serde(default)]
    pub insert_method: InsertMethod,
    #[serde(default = "default_allowed_sizes")]
    pub allowed_sizes: Vec<BannerSize>,
    #[serde(default)]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default = "default_max_banners")]
    pub max_banners: u32,
    #[serde(default)]
    pub rotation: RotationStrategy,
    #[serde(default)]
    pub rotation_interval_secs: Option<u32>,
    #[serde(default)]
    pub device_target: DeviceTarget,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub lazy_load: bool,
    #[serde(default)]
    pub refresh_enabled: bool,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u32,
    #[serde(default = "default_true")]
    pub show_label: bool,
    #[serde(default = "default_label")]
    pub label_text: String,
    #[serde(default)]
    pub container_class: String,
    #[serde(default)]
    pub wrapper_html: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_allowed_sizes() -> Vec<BannerSize> {
    vec![BannerSize::MediumRectangle]
}
fn default_max_banners() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_refresh_interval() -> u32 {
    30
}
fn default_label() -> String {
    "Advertisement".to_string()
}
fn default_priority() -> i32 {
    5
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlacementRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub page_type: Option<PageType>,
    pub position: Option<Position>,
    pub css_selector: Option<String>,
    pub insert_method: Option<InsertMethod>,
    pub allowed_sizes: Option<Vec<BannerSize>>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub max_banners: Option<u32>,
    pub rotation: Option<RotationStrategy>,
    pub rotation_interval_secs: Option<u32>,
    pub device_target: Option<DeviceTarget>,
    pub enabled: Option<bool>,
    pub lazy_load: Option<bool>,
    pub refresh_enabled: Option<bool>,
    pub refresh_interval_secs: Option<u32>,
    pub show_label: Option<bool>,
    pub label_text: Option<String>,
    pub container_class: Option<String>,
    pub wrapper_html: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStats {
    pub placement: Placement,
    pub total_banners: usize,
    pub active_banners: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub ctr: String,
    /// Active banners as a percentage of the placement's slot count.
    pub fill_rate: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

//! Request, filter, and delivery-payload types for the banner manager.

use crate::utm::build_utm_url;
use adpulse_core::documents::AuditAction;
use adpulse_core::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBannerRequest {
    pub name: String,
    #[serde(default)]
    pub internal_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub status: BannerStatus,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub creative: Creative,
    #[serde(default)]
    pub click: ClickThrough,
    #[serde(default)]
    pub placements: Vec<String>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub limits: DeliveryLimits,
    #[serde(default)]
    pub ab_test_group: Option<String>,
}

fn default_priority() -> i32 {
    5
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBannerRequest {
    pub name: Option<String>,
    pub internal_id: Option<String>,
    pub client_id: Option<String>,
    pub campaign_id: Option<String>,
    pub status: Option<BannerStatus>,
    pub priority: Option<i32>,
    pub creative: Option<Creative>,
    pub click: Option<ClickThrough>,
    pub placements: Option<Vec<String>>,
    pub schedule: Option<Schedule>,
    pub targeting: Option<Targeting>,
    pub limits: Option<DeliveryLimits>,
    pub ab_test_group: Option<String>,
}

/// Inventory listing filter; every field is conjunctive when present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerFilter {
    #[serde(default)]
    pub status: Option<BannerStatus>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub placement_id: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
}

/// Request context for delivery selection. Absent fields skip that gate.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryContext {
    #[serde(default)]
    pub device: Option<DeviceTarget>,
    #[serde(default)]
    pub page_type: Option<PageType>,
}

/// The shape a selected banner is delivered to the page in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryBanner {
    pub id: String,
    #[serde(rename = "type")]
    pub creative_type: CreativeType,
    pub size: BannerSize,
    pub asset_url: String,
    pub html_code: String,
    /// Click-through destination with UTM parameters applied.
    pub target_url: String,
    pub alt_text: String,
}

impl DeliveryBanner {
    pub fn from_banner(banner: &Banner) -> Self {
        Self {
            id: banner.id.clone(),
            creative_type: banner.creative.creative_type,
            size: banner.creative.size,
            asset_url: banner.creative.asset_url.clone(),
            html_code: banner.creative.html_code.clone(),
            target_url: build_utm_url(banner),
            alt_text: banner.creative.alt_text.clone(),
        }
    }
}

/// Inventory summary for the admin dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerStats {
    pub total: usize,
    pub active: usize,
    pub paused: usize,
    pub draft: usize,
    pub expired: usize,
    pub scheduled: usize,
    /// Active banners whose end date falls within the next 7 days.
    pub expiring_soon: usize,
    pub clients: usize,
    pub placements: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogFilter {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub action: Option<AuditAction>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

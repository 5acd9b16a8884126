//! Domain types — banners, placements, clients, campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Size table ────────────────────────────────────────────────────────────

/// Standard IAB-style creative sizes. Serialized as kebab-case keys, which
/// are also the keys used by placement `allowedSizes` lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BannerSize {
    Leaderboard,
    MediumRectangle,
    Skyscraper,
    Billboard,
    MobileBanner,
    LargeRectangle,
    HalfPage,
    WideSkyscraper,
    Square,
}

impl BannerSize {
    /// Pixel dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            BannerSize::Leaderboard => (728, 90),
            BannerSize::MediumRectangle => (300, 250),
            BannerSize::Skyscraper => (160, 600),
            BannerSize::Billboard => (970, 250),
            BannerSize::MobileBanner => (320, 100),
            BannerSize::LargeRectangle => (336, 280),
            BannerSize::HalfPage => (300, 600),
            BannerSize::WideSkyscraper => (160, 600),
            BannerSize::Square => (250, 250),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BannerSize::Leaderboard => "Leaderboard",
            BannerSize::MediumRectangle => "Medium Rectangle",
            BannerSize::Skyscraper => "Skyscraper",
            BannerSize::Billboard => "Billboard",
            BannerSize::MobileBanner => "Mobile Banner",
            BannerSize::LargeRectangle => "Large Rectangle",
            BannerSize::HalfPage => "Half Page",
            BannerSize::WideSkyscraper => "Wide Skyscraper",
            BannerSize::Square => "Square",
        }
    }

    pub fn all() -> &'static [BannerSize] {
        &[
            BannerSize::Leaderboard,
            BannerSize::MediumRectangle,
            BannerSize::Skyscraper,
            BannerSize::Billboard,
            BannerSize::MobileBanner,
            BannerSize::LargeRectangle,
            BannerSize::HalfPage,
            BannerSize::WideSkyscraper,
            BannerSize::Square,
        ]
    }
}

// ─── Shared enums ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BannerStatus {
    Active,
    Paused,
    Expired,
    #[default]
    Draft,
    Scheduled,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CreativeType {
    #[default]
    Image,
    Html,
    Video,
    Adsense,
}

/// Strategy for choosing which eligible banners fill a placement's slots.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    Random,
    #[default]
    Weighted,
    Sequential,
    Even,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTarget {
    #[default]
    All,
    Desktop,
    Mobile,
    Tablet,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Homepage,
    Article,
    Category,
    Archive,
    Search,
    Author,
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    Top,
    #[default]
    Sidebar,
    Footer,
    Inline,
    StickyTop,
    StickyBottom,
    Floating,
    Interstitial,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsertMethod {
    #[default]
    Append,
    Prepend,
    Before,
    After,
}

// ─── Banner ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    #[serde(default)]
    pub internal_id: String,
    pub name: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub status: BannerStatus,
    /// Higher wins under weighted rotation and ties in even rotation.
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub creative: Creative,
    #[serde(default)]
    pub click: ClickThrough,
    /// Placement ids this banner may be delivered through. A banner with no
    /// placements is never delivered.
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
    #[serde(default = "default_version")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_user")]
    pub created_by: String,
    #[serde(default = "default_user")]
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    #[serde(default)]
    pub creative_type: CreativeType,
    #[serde(default = "default_size")]
    pub size: BannerSize,
    #[serde(default)]
    pub custom_width: Option<u32>,
    #[serde(default)]
    pub custom_height: Option<u32>,
    #[serde(default)]
    pub asset_url: String,
    #[serde(default)]
    pub asset_path: String,
    #[serde(default)]
    pub html_code: String,
    #[serde(default = "default_alt_text")]
    pub alt_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickThrough {
    #[serde(default)]
    pub target_url: String,
    #[serde(default = "default_utm_source")]
    pub utm_source: String,
    #[serde(default = "default_utm_medium")]
    pub utm_medium: String,
    #[serde(default)]
    pub utm_campaign: String,
    #[serde(default)]
    pub utm_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Daily serving windows. Empty means all day.
    #[serde(default)]
    pub time_windows: Vec<TimeWindow>,
}

/// Zero-padded 24h "HH:MM" bounds, both inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl Schedule {
    /// Whether the schedule permits serving at `now`. A missing date bound
    /// is unbounded on that side; time windows compare the zero-padded
    /// "HH:MM" clock string against each window's inclusive bounds.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if let Some(start) = self.start_date {
            if start > now {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if end < now {
                return false;
            }
        }
        if !self.time_windows.is_empty() {
            let clock = now.format("%H:%M").to_string();
            if !self
                .time_windows
                .iter()
                .any(|w| w.start.as_str() <= clock.as_str() && clock.as_str() <= w.end.as_str())
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Targeting {
    /// Page types the banner may appear on; `all` matches everything.
    #[serde(default = "default_page_targeting")]
    pub page_targeting: Vec<PageType>,
    #[serde(default)]
    pub category_targeting: Vec<String>,
    #[serde(default)]
    pub device_targeting: DeviceTarget,
    /// Country codes; empty means worldwide.
    #[serde(default)]
    pub geo_targeting: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLimits {
    #[serde(default)]
    pub impression_limit: Option<u64>,
    #[serde(default)]
    pub click_limit: Option<u64>,
    /// Max impressions per session per day.
    #[serde(default)]
    pub frequency_cap: Option<u32>,
}

impl Default for Creative {
    fn default() -> Self {
        Self {
            creative_type: CreativeType::Image,
            size: default_size(),
            custom_width: None,
            custom_height: None,
            asset_url: String::new(),
            asset_path: String::new(),
            html_code: String::new(),
            alt_text: default_alt_text(),
        }
    }
}

impl Default for ClickThrough {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            utm_source: default_utm_source(),
            utm_medium: default_utm_medium(),
            utm_campaign: String::new(),
            utm_content: String::new(),
        }
    }
}

impl Default for Targeting {
    fn default() -> Self {
        Self {
            page_targeting: default_page_targeting(),
            category_targeting: Vec::new(),
            device_targeting: DeviceTarget::All,
            geo_targeting: Vec::new(),
        }
    }
}

// ─── Client ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientTier {
    #[default]
    Standard,
    Premium,
    Enterprise,
}

/// An advertiser account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    #[serde(default)]
    pub billing_email: String,
    #[serde(default = "default_payment_terms")]
    pub payment_terms: String,
}

impl Default for Billing {
    fn default() -> Self {
        Self {
            billing_email: String::new(),
            payment_terms: default_payment_terms(),
        }
    }
}

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetType {
    Daily,
    Monthly,
    Total,
    #[default]
    Unlimited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub budget_type: BudgetType,
    #[serde(default)]
    pub spent_amount: f64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub impression_goal: Option<u64>,
    #[serde(default)]
    pub click_goal: Option<u64>,
    #[serde(default = "default_page_targeting")]
    pub default_page_targeting: Vec<PageType>,
    #[serde(default)]
    pub default_device_targeting: DeviceTarget,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Placement ─────────────────────────────────────────────────────────────

/// A named ad slot on the site: where it renders, which creative sizes fit,
/// and how eligible banners rotate through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
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
    /// Seconds between in-page auto-rotations, when enabled.
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
    #[serde(default = "default_alt_text")]
    pub label_text: String,
    #[serde(default)]
    pub container_class: String,
    #[serde(default)]
    pub wrapper_html: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Serde defaults ────────────────────────────────────────────────────────

fn default_priority() -> i32 {
    5
}
fn default_version() -> u32 {
    1
}
fn default_user() -> String {
    "admin".to_string()
}
fn default_size() -> BannerSize {
    BannerSize::MediumRectangle
}
fn default_alt_text() -> String {
    "Advertisement".to_string()
}
fn default_utm_source() -> String {
    "adpulse".to_string()
}
fn default_utm_medium() -> String {
    "banner".to_string()
}
fn default_page_targeting() -> Vec<PageType> {
    vec![PageType::All]
}
fn default_payment_terms() -> String {
    "net30".to_string()
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

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_size_table() {
        assert_eq!(BannerSize::Leaderboard.dimensions(), (728, 90));
        assert_eq!(BannerSize::MediumRectangle.dimensions(), (300, 250));
        assert_eq!(BannerSize::all().len(), 9);
    }

    #[test]
    fn test_size_serde_kebab_case() {
        let json = serde_json::to_string(&BannerSize::MediumRectangle).unwrap();
        assert_eq!(json, "\"medium-rectangle\"");
        let back: BannerSize = serde_json::from_str("\"half-page\"").unwrap();
        assert_eq!(back, BannerSize::HalfPage);
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&BannerStatus::Scheduled).unwrap(),
            "\"scheduled\""
        );
        let rot: RotationStrategy = serde_json::from_str("\"sequential\"").unwrap();
        assert_eq!(rot, RotationStrategy::Sequential);
    }

    #[test]
    fn test_schedule_date_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let mut schedule = Schedule::default();
        assert!(schedule.contains(now));

        schedule.start_date = Some(Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 0).unwrap());
        assert!(!schedule.contains(now), "future start excludes now");

        schedule.start_date = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        schedule.end_date = Some(Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
        assert!(!schedule.contains(now), "past end excludes now");

        schedule.end_date = Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap());
        assert!(schedule.contains(now));
    }

    #[test]
    fn test_schedule_time_windows_inclusive() {
        let noon = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let schedule = Schedule {
            start_date: None,
            end_date: None,
            time_windows: vec![TimeWindow {
                start: "09:00".into(),
                end: "12:00".into(),
            }],
        };
        assert!(schedule.contains(noon), "end bound is inclusive");

        let evening = Utc.with_ymd_and_hms(2024, 6, 15, 18, 30, 0).unwrap();
        assert!(!schedule.contains(evening));
    }

    #[test]
    fn test_banner_round_trip_camel_case() {
        let now = Utc::now();
        let banner = Banner {
            id: "ban_1".into(),
            internal_id: String::new(),
            name: "Test".into(),
            client_id: Some("cli_1".into()),
            campaign_id: None,
            status: BannerStatus::Active,
            priority: 7,
            creative: Creative::default(),
            click: ClickThrough::default(),
            placements: vec!["article-sidebar".into()],
            schedule: Schedule::default(),
            targeting: Targeting::default(),
            limits: DeliveryLimits::default(),
            ab_test_group: None,
            version: 1,
            created_at: now,
            updated_at: now,
            created_by: "admin".into(),
            updated_by: "admin".into(),
        };
        let json = serde_json::to_value(&banner).unwrap();
        assert_eq!(json["clientId"], "cli_1");
        assert_eq!(json["creative"]["altText"], "Advertisement");
        let back: Banner = serde_json::from_value(json).unwrap();
        assert_eq!(back, banner);
    }
}

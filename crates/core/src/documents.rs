//! Persisted document schemas — the entity store and the analytics store.
//!
//! Both stores are single JSON documents, read and written whole. The entity
//! document holds the inventory (banners, clients, campaigns, placements)
//! plus the audit log and banner revision history; the analytics document
//! holds capped event rings and the date-keyed rollup that reporting reads.

use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Most-recent events retained per ring (impressions, clicks).
pub const EVENT_BUFFER_CAP: usize = 10_000;
/// Most-recent audit entries retained.
pub const AUDIT_LOG_CAP: usize = 1_000;
/// Revisions retained per banner.
pub const BANNER_HISTORY_CAP: usize = 25;

/// Rollup date key: `YYYY-MM-DD` in UTC.
pub fn date_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Click-through rate as a 2-decimal percentage string, `"0"` when there
/// are no impressions.
pub fn ctr_string(impressions: u64, clicks: u64) -> String {
    if impressions > 0 {
        format!("{:.2}", clicks as f64 / impressions as f64 * 100.0)
    } else {
        "0".to_string()
    }
}

// ─── Entity document ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDocument {
    #[serde(default)]
    pub banners: Vec<Banner>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub placements: Vec<Placement>,
    /// Bounded per-banner revision rings, newest first.
    #[serde(default)]
    pub banner_history: HashMap<String, VecDeque<BannerRevision>>,
    /// Newest first, capped at [`AUDIT_LOG_CAP`].
    #[serde(default)]
    pub audit_log: VecDeque<AuditEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for EntityDocument {
    fn default() -> Self {
        Self {
            banners: Vec::new(),
            clients: Vec::new(),
            campaigns: Vec::new(),
            placements: default_placements(),
            banner_history: HashMap::new(),
            audit_log: VecDeque::new(),
            settings: Settings::default(),
        }
    }
}

impl EntityDocument {
    pub fn banner(&self, id: &str) -> Option<&Banner> {
        self.banners.iter().find(|b| b.id == id)
    }

    pub fn banner_mut(&mut self, id: &str) -> Option<&mut Banner> {
        self.banners.iter_mut().find(|b| b.id == id)
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn client_mut(&mut self, id: &str) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    pub fn campaign(&self, id: &str) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    pub fn campaign_mut(&mut self, id: &str) -> Option<&mut Campaign> {
        self.campaigns.iter_mut().find(|c| c.id == id)
    }

    pub fn placement(&self, id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn placement_mut(&mut self, id: &str) -> Option<&mut Placement> {
        self.placements.iter_mut().find(|p| p.id == id)
    }

    /// Prepend an audit entry, trimming the log to its cap.
    pub fn push_audit(&mut self, entry: AuditEntry) {
        self.audit_log.push_front(entry);
        self.audit_log.truncate(AUDIT_LOG_CAP);
    }

    /// Prepend a banner revision, trimming that banner's ring to its cap.
    pub fn push_revision(&mut self, banner_id: &str, revision: BannerRevision) {
        let ring = self.banner_history.entry(banner_id.to_string()).or_default();
        ring.push_front(revision);
        ring.truncate(BANNER_HISTORY_CAP);
    }
}

/// One superseded banner state, captured on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerRevision {
    pub version: u32,
    pub banner: Banner,
    pub superseded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub action: AuditAction,
    pub entity_id: String,
    pub user_id: String,
    #[serde(default)]
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BannerCreated,
    BannerUpdated,
    BannerDeleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub default_rotation: RotationStrategy,
    #[serde(default = "default_frequency_cap")]
    pub frequency_cap: u32,
    #[serde(default = "default_true")]
    pub lazy_loading: bool,
    #[serde(default = "default_true")]
    pub gdpr_compliant: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_rotation: RotationStrategy::Weighted,
            frequency_cap: default_frequency_cap(),
            lazy_loading: true,
            gdpr_compliant: true,
        }
    }
}

fn default_frequency_cap() -> u32 {
    5
}
fn default_true() -> bool {
    true
}

/// The standard placement set seeded into a fresh entity document.
pub fn default_placements() -> Vec<Placement> {
    let seed = |id: &str,
                name: &str,
                page_type: PageType,
                position: Position,
                allowed_sizes: Vec<BannerSize>,
                max_banners: u32,
                rotation: RotationStrategy,
                description: &str| {
        let now = Utc::now();
        Placement {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            page_type,
            position,
            css_selector: String::new(),
            insert_method: InsertMethod::Append,
            allowed_sizes,
            min_width: None,
            max_width: None,
            max_banners,
            rotation,
            rotation_interval_secs: None,
            device_target: DeviceTarget::All,
            enabled: true,
            lazy_load: true,
            refresh_enabled: false,
            refresh_interval_secs: 30,
            show_label: true,
            label_text: "Advertisement".to_string(),
            container_class: String::new(),
            wrapper_html: String::new(),
            priority: 5,
            created_at: now,
            updated_at: now,
        }
    };

    let mut placements = vec![
        seed(
            "homepage-top-leaderboard",
            "Homepage Top Leaderboard",
            PageType::Homepage,
            Position::Top,
            vec![BannerSize::Leaderboard, BannerSize::Billboard],
            3,
            RotationStrategy::Weighted,
            "Premium placement above main content",
        ),
        seed(
            "article-sidebar",
            "Article Sidebar",
            PageType::Article,
            Position::Sidebar,
            vec![
                BannerSize::MediumRectangle,
                BannerSize::HalfPage,
                BannerSize::Skyscraper,
            ],
            2,
            RotationStrategy::Weighted,
            "Sidebar placement on article pages",
        ),
        seed(
            "article-inline",
            "Article Inline",
            PageType::Article,
            Position::Inline,
            vec![BannerSize::MediumRectangle, BannerSize::LargeRectangle],
            2,
            RotationStrategy::Sequential,
            "Inline placement within article content",
        ),
        seed(
            "footer-global",
            "Footer Global Banner",
            PageType::All,
            Position::Footer,
            vec![BannerSize::Billboard, BannerSize::Leaderboard],
            1,
            RotationStrategy::Random,
            "Global footer placement on all pages",
        ),
        seed(
            "mobile-sticky",
            "Mobile Sticky Bottom",
            PageType::All,
            Position::StickyBottom,
            vec![BannerSize::MobileBanner],
            1,
            RotationStrategy::Weighted,
            "Sticky banner for mobile devices",
        ),
        seed(
            "category-header",
            "Category Page Header",
            PageType::Category,
            Position::Top,
            vec![BannerSize::Leaderboard, BannerSize::Billboard],
            2,
            RotationStrategy::Weighted,
            "Header placement on category archive pages",
        ),
        seed(
            "between-articles",
            "Between Articles",
            PageType::Archive,
            Position::Inline,
            vec![BannerSize::MediumRectangle, BannerSize::LargeRectangle],
            3,
            RotationStrategy::Sequential,
            "Inserted between article listings",
        ),
    ];

    if let Some(mobile) = placements.iter_mut().find(|p| p.id == "mobile-sticky") {
        mobile.device_target = DeviceTarget::Mobile;
    }
    placements
}

// ─── Analytics document ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDocument {
    /// Newest first, capped at [`EVENT_BUFFER_CAP`].
    #[serde(default)]
    pub impressions: VecDeque<TrackedEvent>,
    /// Newest first, capped at [`EVENT_BUFFER_CAP`].
    #[serde(default)]
    pub clicks: VecDeque<TrackedEvent>,
    /// Durable rollup keyed by `YYYY-MM-DD`; the reporting source of truth.
    #[serde(default)]
    pub daily_stats: BTreeMap<String, DayBucket>,
    pub last_cleanup: DateTime<Utc>,
}

impl Default for AnalyticsDocument {
    fn default() -> Self {
        Self {
            impressions: VecDeque::new(),
            clicks: VecDeque::new(),
            daily_stats: BTreeMap::new(),
            last_cleanup: Utc::now(),
        }
    }
}

impl AnalyticsDocument {
    pub fn day(&self, key: &str) -> Option<&DayBucket> {
        self.daily_stats.get(key)
    }

    /// The bucket for `key`, created empty if missing.
    pub fn day_mut(&mut self, key: &str) -> &mut DayBucket {
        self.daily_stats.entry(key.to_string()).or_default()
    }

    /// Lifetime per-banner counts, summed across all rollup days.
    pub fn banner_totals(&self) -> HashMap<String, Counts> {
        let mut totals: HashMap<String, Counts> = HashMap::new();
        for bucket in self.daily_stats.values() {
            for (id, counts) in &bucket.banners {
                let entry = totals.entry(id.clone()).or_default();
                entry.impressions += counts.impressions;
                entry.clicks += counts.clicks;
            }
        }
        totals
    }

    /// Lifetime per-placement counts, summed across all rollup days.
    pub fn placement_totals(&self) -> HashMap<String, Counts> {
        let mut totals: HashMap<String, Counts> = HashMap::new();
        for bucket in self.daily_stats.values() {
            for (id, counts) in &bucket.placements {
                let entry = totals.entry(id.clone()).or_default();
                entry.impressions += counts.impressions;
                entry.clicks += counts.clicks;
            }
        }
        totals
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub banners: HashMap<String, Counts>,
    #[serde(default)]
    pub placements: HashMap<String, Counts>,
    #[serde(default)]
    pub clients: HashMap<String, Counts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
}

/// An immutable impression or click record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub id: String,
    pub banner_id: String,
    #[serde(default)]
    pub placement_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub page_url: String,
    /// Page type for impressions.
    #[serde(default)]
    pub page_type: String,
    /// Destination for clicks.
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default)]
    pub viewport: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
}

fn default_device() -> String {
    "unknown".to_string()
}

// ─── Tests ─────────────────────────────────────────────────────────────────

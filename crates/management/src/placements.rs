//! Ad slot management — CRUD, page-type lookup, fill stats, embed snippets.

use crate::models::{
    CreatePlacementRequest, PlacementStats, UpdatePlacementRequest, ValidationReport,
};
use adpulse_core::documents::ctr_string;
use adpulse_core::types::{Banner, BannerStatus, PageType, Placement};
use adpulse_core::{ids, AdPulseError, AdPulseResult};
use adpulse_store::{AnalyticsStore, EntityStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct PlacementManager {
    entities: Arc<EntityStore>,
    analytics: Arc<AnalyticsStore>,
}

impl PlacementManager {
    pub fn new(entities: Arc<EntityStore>, analytics: Arc<AnalyticsStore>) -> Self {
        Self {
            entities,
            analytics,
        }
    }

    pub fn all(&self) -> Vec<Placement> {
        self.entities.read(|doc| doc.placements.clone())
    }

    pub fn get(&self, id: &str) -> AdPulseResult<Placement> {
        self.entities
            .read(|doc| doc.placement(id).cloned())
            .ok_or_else(|| AdPulseError::not_found("placement", id))
    }

    pub fn create(&self, req: CreatePlacementRequest) -> AdPulseResult<Placement> {
        let now = Utc::now();
        let placement = Placement {
            id: req.id.unwrap_or_else(|| ids::generate("plc")),
            name: req.name,
            description: req.description,
            page_type: req.page_type,
            position: req.position,
            css_selector: req.css_selector,
            insert_method: req.insert_method,
            allowed_sizes: req.allowed_sizes,
            min_width: req.min_width,
            max_width: req.max_width,
            max_banners: req.max_banners,
            rotation: req.rotation,
            rotation_interval_secs: req.rotation_interval_secs,
            device_target: req.device_target,
            enabled: req.enabled,
            lazy_load: req.lazy_load,
            refresh_enabled: req.refresh_enabled,
            refresh_interval_secs: req.refresh_interval_secs,
            show_label: req.show_label,
            label_text: req.label_text,
            container_class: req.container_class,
            wrapper_html: req.wrapper_html,
            priority: req.priority,
            created_at: now,
            updated_at: now,
        };
        Self::ensure_valid(&placement)?;

        let stored = placement.clone();
        self.entities.mutate(move |doc| {
            if doc.placement(&placement.id).is_some() {
                return Err(AdPulseError::Validation(format!(
                    "placement id already in use: {}",
                    placement.id
                )));
            }
            doc.placements.push(placement);
            Ok(())
        })?;
        info!(placement_id = %stored.id, name = %stored.name, "Placement created");
        Ok(stored)
    }

    pub fn update(&self, id: &str, req: UpdatePlacementRequest) -> AdPulseResult<Placement> {
        self.entities.mutate(|doc| {
            let placement = doc
                .placement_mut(id)
                .ok_or_else(|| AdPulseError::not_found("placement", id))?;
            if let Some(name) = req.name {
                placement.name = name;
            }
            if let Some(description) = req.description {
                placement.description = description;
            }
            if let Some(page_type) = req.page_type {
                placement.page_type = page_type;
            }
            if let Some(position) = req.position {
                placement.position = position;
            }
            if let Some(selector) = req.css_selector {
                placement.css_selector = selector;
            }
            if let Some(method) = req.insert_method {
                placement.insert_method = method;
            }
            if let Some(sizes) = req.allowed_sizes {
                placement.allowed_sizes = sizes;
            }
            if let Some(min_width) = req.min_width {
                placement.min_width = Some(min_width);
            }
            if let Some(max_width) = req.max_width {
                placement.max_width = Some(max_width);
            }
            if let Some(max_banners) = req.max_banners {
                placement.max_banners = max_banners;
            }
            if let Some(rotation) = req.rotation {
                placement.rotation = rotation;
            }
            if let Some(interval) = req.rotation_interval_secs {
                placement.rotation_interval_secs = Some(interval);
            }
            if let Some(device) = req.device_target {
                placement.device_target = device;
            }
            if let Some(enabled) = req.enabled {
                placement.enabled = enabled;
            }
            if let Some(lazy) = req.lazy_load {
                placement.lazy_load = lazy;
            }
            if let Some(refresh) = req.refresh_enabled {
                placement.refresh_enabled = refresh;
            }
            if let Some(interval) = req.refresh_interval_secs {
                placement.refresh_interval_secs = interval;
            }
            if let Some(show) = req.show_label {
                placement.show_label = show;
            }
            if let Some(label) = req.label_text {
                placement.label_text = label;
            }
            if let Some(class) = req.container_class {
                placement.container_class = class;
            }
            if let Some(html) = req.wrapper_html {
                placement.wrapper_html = html;
            }
            if let Some(priority) = req.priority {
                placement.priority = priority;
            }
            placement.updated_at = Utc::now();
            let updated = placement.clone();
            Self::ensure_valid(&updated)?;
            Ok(updated)
        })
    }

    /// Delete a placement. Refused while any banner still lists it.
    pub fn delete(&self, id: &str) -> AdPulseResult<()> {
        self.entities.mutate(|doc| {
            if doc.placement(id).is_none() {
                return Err(AdPulseError::not_found("placement", id));
            }
            let assigned = doc
                .banners
                .iter()
                .filter(|b| b.placements.iter().any(|p| p == id))
                .count();
            if assigned > 0 {
                return Err(AdPulseError::ReferentialIntegrity(format!(
                    "cannot delete placement with {assigned} assigned banner(s); \
                     reassign or remove them first"
                )));
            }
            doc.placements.retain(|p| p.id != id);
            Ok(())
        })?;
        info!(placement_id = %id, "Placement deleted");
        Ok(())
    }

    pub fn toggle(&self, id: &str) -> AdPulseResult<Placement> {
        self.entities.mutate(|doc| {
            let placement = doc
                .placement_mut(id)
                .ok_or_else(|| AdPulseError::not_found("placement", id))?;
            placement.enabled = !placement.enabled;
            placement.updated_at = Utc::now();
            Ok(placement.clone())
        })
    }

    /// Enabled placements serving the given page type (exact match or the
    /// `all` wildcard).
    pub fn by_page_type(&self, page_type: PageType) -> Vec<Placement> {
        self.entities.read(|doc| {
            doc.placements
                .iter()
                .filter(|p| p.enabled && (p.page_type == page_type || p.page_type == PageType::All))
                .cloned()
                .collect()
        })
    }

    /// Banners assigned to the placement, regardless of status.
    pub fn banners_for(&self, placement_id: &str) -> Vec<Banner> {
        self.entities.read(|doc| {
            doc.banners
                .iter()
                .filter(|b| b.placements.iter().any(|p| p == placement_id))
                .cloned()
                .collect()
        })
    }

    pub fn stats(&self, placement_id: &str) -> AdPulseResult<PlacementStats> {
        let placement = self.get(placement_id)?;
        let banners = self.banners_for(placement_id);
        let counts = self.analytics.read(|doc| {
            doc.placement_totals()
                .get(placement_id)
                .copied()
                .unwrap_or_default()
        });

        let active = banners
            .iter()
            .filter(|b| b.status == BannerStatus::Active)
            .count();
        let fill_rate = format!(
            "{:.1}",
            active as f64 / placement.max_banners as f64 * 100.0
        );

        Ok(PlacementStats {
            total_banners: banners.len(),
            active_banners: active,
            total_impressions: counts.impressions,
            total_clicks: counts.clicks,
            ctr: ctr_string(counts.impressions, counts.clicks),
            fill_rate,
            placement,
        })
    }

    pub fn stats_all(&self) -> Vec<PlacementStats> {
        self.all()
            .into_iter()
            .filter_map(|p| self.stats(&p.id).ok())
            .collect()
    }

    /// Self-contained embed snippet for the generated site's templates.
    pub fn embed_code(placement: &Placement) -> String {
        format!(
            r#"<!-- AdPulse Placement: {name} -->
<div class="ap-ad-placement"
     data-placement-id="{id}"
     data-lazy-load="{lazy}"
     data-refresh="{refresh}"
     data-refresh-interval="{interval}">
    <script>
        (function() {{
            window.AdPulseSlots = window.AdPulseSlots || [];
            window.AdPulseSlots.push({{
                placementId: '{id}',
                container: document.currentScript.parentNode
            }});
        }})();
    </script>
    <noscript>
        <a href="/ads/fallback/{id}" target="_blank">
            <img src="/ads/fallback/{id}/image" alt="{label}">
        </a>
    </noscript>
</div>
<!-- End AdPulse Placement -->"#,
            name = placement.name,
            id = placement.id,
            lazy = placement.lazy_load,
            refresh = placement.refresh_enabled,
            interval = placement.refresh_interval_secs,
            label = placement.label_text,
        )
    }

    /// Configuration checks; collects every violation rather than failing
    /// fast.
    pub fn validate(placement: &Placement) -> ValidationReport {
        let mut errors = Vec::new();

        if placement.name.trim().is_empty() {
            errors.push("Placement name is required".to_string());
        }
        if placement.allowed_sizes.is_empty() {
            errors.push("At least one allowed size is required".to_string());
        }
        if placement.max_banners < 1 {
            errors.push("Max banners must be at least 1".to_string());
        }
        if let Some(interval) = placement.rotation_interval_secs {
            if interval < 5 {
                errors.push("Rotation interval must be at least 5 seconds".to_string());
            }
        }
        if placement.refresh_interval_secs < 10 {
            errors.push("Refresh interval must be at least 10 seconds".to_string());
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    fn ensure_valid(placement: &Placement) -> AdPulseResult<()> {
        let report = Self::validate(placement);
        if report.valid {
            Ok(())
        } else {
            Err(AdPulseError::Validation(report.errors.join("; ")))
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adpulse_core::documents::Counts;
    use adpulse_core::types::{BannerSize, Position, RotationStrategy};

    fn manager() -> (
        PlacementManager,
        Arc<EntityStore>,
        Arc<AnalyticsStore>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let entities = Arc::new(EntityStore::open(dir.path().join("banners.json")).unwrap());
        let analytics = Arc::new(AnalyticsStore::open(dir.path().join("analytics.json")).unwrap());
        (
            PlacementManager::new(entities.clone(), analytics.clone()),
            entities,
            analytics,
            dir,
        )
    }

    fn create_req(name: &str) -> CreatePlacementRequest {
        CreatePlacementRequest {
            id: None,
            name: name.to_string(),
            description: String::new(),
            page_type: PageType::Article,
            position: Position::Sidebar,
            css_selector: String::new(),
            insert_method: Default::default(),
            allowed_sizes: vec![BannerSize::MediumRectangle],
            min_width: None,
            max_width: None,
            max_banners: 2,
            rotation: RotationStrategy::Weighted,
            rotation_interval_secs: None,
            device_target: Default::default(),
            enabled: true,
            lazy_load: true,
            refresh_enabled: false,
            refresh_interval_secs: 30,
            show_label: true,
            label_text: "Advertisement".into(),
            container_class: String::new(),
            wrapper_html: String::new(),
            priority: 5,
        }
    }

    #[test]
    fn test_create_with_custom_id() {
        let (manager, _, _, _dir) = manager();
        let mut req = create_req("Sponsor Box");
        req.id = Some("sponsor-box".into());
        let placement = manager.create(req).unwrap();
        assert_eq!(placement.id, "sponsor-box");
        assert!(manager.get("sponsor-box").is_ok());
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let (manager, _, _, _dir) = manager();
        let mut req = create_req("Dup");
        req.id = Some("article-sidebar".into()); // seeded default
        assert!(matches!(
            manager.create(req),
            Err(AdPulseError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let (manager, _, _, _dir) = manager();
        let mut req = create_req("  ");
        req.allowed_sizes = vec![];
        req.max_banners = 0;
        req.rotation_interval_secs = Some(2);
        req.refresh_interval_secs = 3;
        let err = manager.create(req).unwrap_err();
        let AdPulseError::Validation(message) = err else {
            panic!("expected validation error");
        };
        assert!(message.contains("name is required"));
        assert!(message.contains("allowed size"));
        assert!(message.contains("at least 1"));
        assert!(message.contains("5 seconds"));
        assert!(message.contains("10 seconds"));
    }

    #[test]
    fn test_by_page_type_includes_wildcard() {
        let (manager, _, _, _dir) = manager();
        let article = manager.by_page_type(PageType::Article);
        let ids: Vec<&str> = article.iter().map(|p| p.id.as_str()).collect();
        assert!(ids.contains(&"article-sidebar"));
        assert!(ids.contains(&"article-inline"));
        assert!(ids.contains(&"footer-global"), "pageType=all matches");
        assert!(!ids.contains(&"homepage-top-leaderboard"));
    }

    #[test]
    fn test_toggle_disables_and_hides_from_lookup() {
        let (manager, _, _, _dir) = manager();
        let toggled = manager.toggle("article-sidebar").unwrap();
        assert!(!toggled.enabled);
        let article = manager.by_page_type(PageType::Article);
        assert!(!article.iter().any(|p| p.id == "article-sidebar"));
    }

    #[test]
    fn test_delete_blocked_while_banner_assigned() {
        let (manager, entities, _, _dir) = manager();
        entities
            .mutate(|doc| {
                let now = Utc::now();
                doc.banners.push(Banner {
                    id: "ban_1".into(),
                    internal_id: String::new(),
                    name: "Live".into(),
                    client_id: None,
                    campaign_id: None,
                    status: BannerStatus::Paused,
                    priority: 5,
                    creative: Default::default(),
                    click: Default::default(),
                    placements: vec!["article-sidebar".into()],
                    schedule: Default::default(),
                    targeting: Default::default(),
                    limits: Default::default(),
                    ab_test_group: None,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                    created_by: "admin".into(),
                    updated_by: "admin".into(),
                });
                Ok(())
            })
            .unwrap();

        // Even a paused banner blocks deletion: the guard is on assignment.
        let err = manager.delete("article-sidebar").unwrap_err();
        assert!(matches!(err, AdPulseError::ReferentialIntegrity(_)));
        assert!(manager.get("article-sidebar").is_ok());

        manager.delete("category-header").unwrap();
        assert!(manager.get("category-header").is_err());
    }

    #[test]
    fn test_stats_fill_rate_and_ctr() {
        let (manager, entities, analytics, _dir) = manager();
        entities
            .mutate(|doc| {
                let now = Utc::now();
                doc.banners.push(Banner {
                    id: "ban_1".into(),
                    internal_id: String::new(),
                    name: "Live".into(),
                    client_id: None,
                    campaign_id: None,
                    status: BannerStatus::Active,
                    priority: 5,
                    creative: Default::default(),
                    click: Default::default(),
                    placements: vec!["article-sidebar".into()],
                    schedule: Default::default(),
                    targeting: Default::default(),
                    limits: Default::default(),
                    ab_test_group: None,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                    created_by: "admin".into(),
                    updated_by: "admin".into(),
                });
                Ok(())
            })
            .unwrap();
        analytics
            .mutate(|doc| {
                doc.day_mut("2024-02-01").placements.insert(
                    "article-sidebar".into(),
                    Counts {
                        impressions: 200,
                        clicks: 3,
                    },
                );
                Ok(())
            })
            .unwrap();

        let stats = manager.stats("article-sidebar").unwrap();
        assert_eq!(stats.total_banners, 1);
        assert_eq!(stats.active_banners, 1);
        assert_eq!(stats.total_impressions, 200);
        assert_eq!(stats.ctr, "1.50");
        // article-sidebar seeds maxBanners = 2.
        assert_eq!(stats.fill_rate, "50.0");
    }

    #[test]
    fn test_embed_code_references_placement() {
        let (manager, _, _, _dir) = manager();
        let placement = manager.get("article-sidebar").unwrap();
        let code = PlacementManager::embed_code(&placement);
        assert!(code.contains("data-placement-id=\"article-sidebar\""));
        assert!(code.contains("window.AdPulseSlots"));
        assert!(code.contains("/ads/fallback/article-sidebar"));
    }
}

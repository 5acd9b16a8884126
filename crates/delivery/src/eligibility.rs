//! Delivery eligibility gates.

use crate::models::DeliveryContext;
use adpulse_core::types::{Banner, BannerStatus, DeviceTarget, PageType, Placement};
use chrono::{DateTime, Utc};

/// Whether `banner` may serve through `placement` for this request.
///
/// Gates, in order: active status, placement assignment, size fit, schedule
/// (date range + time windows), device targeting, page targeting. Gates for
/// context fields the request did not supply are skipped.
pub fn eligible_for_placement(
    banner: &Banner,
    placement: &Placement,
    ctx: &DeliveryContext,
    now: DateTime<Utc>,
) -> bool {
    if banner.status != BannerStatus::Active {
        return false;
    }
    if !banner.placements.iter().any(|p| p == &placement.id) {
        return false;
    }
    if !placement.allowed_sizes.contains(&banner.creative.size) {
        return false;
    }
    if !banner.schedule.contains(now) {
        return false;
    }
    if let Some(device) = ctx.device {
        let target = banner.targeting.device_targeting;
        if target != DeviceTarget::All && target != device {
            return false;
        }
    }
    if let Some(page_type) = ctx.page_type {
        let pages = &banner.targeting.page_targeting;
        if !pages.contains(&PageType::All) && !pages.contains(&page_type) {
            return false;
        }
    }
    true
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adpulse_core::documents::default_placements;
    use adpulse_core::types::{BannerSize, Schedule, Targeting};
    use chrono::Duration;

    fn sidebar() -> Placement {
        default_placements()
            .into_iter()
            .find(|p| p.id == "article-sidebar")
            .unwrap()
    }

    fn active_banner() -> Banner {
        let now = Utc::now();
        Banner {
            id: "ban_1".into(),
            internal_id: String::new(),
            name: "Test".into(),
            client_id: None,
            campaign_id: None,
            status: BannerStatus::Active,
            priority: 5,
            creative: Default::default(), // medium-rectangle
            click: Default::default(),
            placements: vec!["article-sidebar".into()],
            schedule: Schedule::default(),
            targeting: Targeting::default(),
            limits: Default::default(),
            ab_test_group: None,
            version: 1,
            created_at: now,
            updated_at: now,
            created_by: "admin".into(),
            updated_by: "admin".into(),
        }
    }

    #[test]
    fn test_happy_path() {
        let banner = active_banner();
        assert!(eligible_for_placement(
            &banner,
            &sidebar(),
            &DeliveryContext::default(),
            Utc::now(),
        ));
    }

    #[test]
    fn test_non_active_status_excluded() {
        for status in [
            BannerStatus::Paused,
            BannerStatus::Draft,
            BannerStatus::Expired,
            BannerStatus::Scheduled,
        ] {
            let mut banner = active_banner();
            banner.status = status;
            assert!(!eligible_for_placement(
                &banner,
                &sidebar(),
                &DeliveryContext::default(),
                Utc::now(),
            ));
        }
    }

    #[test]
    fn test_unassigned_placement_excluded() {
        let mut banner = active_banner();
        banner.placements = vec!["footer-global".into()];
        assert!(!eligible_for_placement(
            &banner,
            &sidebar(),
            &DeliveryContext::default(),
            Utc::now(),
        ));
    }

    #[test]
    fn test_size_must_fit_placement() {
        let mut banner = active_banner();
        banner.creative.size = BannerSize::Billboard; // not in sidebar's allowed set
        assert!(!eligible_for_placement(
            &banner,
            &sidebar(),
            &DeliveryContext::default(),
            Utc::now(),
        ));
    }

    #[test]
    fn test_future_start_excluded_even_when_active() {
        let mut banner = active_banner();
        banner.schedule.start_date = Some(Utc::now() + Duration::days(1));
        assert!(
            !eligible_for_placement(
                &banner,
                &sidebar(),
                &DeliveryContext::default(),
                Utc::now(),
            ),
            "schedule gate excludes a banner forced active before its start"
        );
    }

    #[test]
    fn test_device_gate() {
        let mut banner = active_banner();
        banner.targeting.device_targeting = DeviceTarget::Mobile;

        let mobile = DeliveryContext {
            device: Some(DeviceTarget::Mobile),
            page_type: None,
        };
        let desktop = DeliveryContext {
            device: Some(DeviceTarget::Desktop),
            page_type: None,
        };
        let unspecified = DeliveryContext::default();

        assert!(eligible_for_placement(&banner, &sidebar(), &mobile, Utc::now()));
        assert!(!eligible_for_placement(&banner, &sidebar(), &desktop, Utc::now()));
        assert!(
            eligible_for_placement(&banner, &sidebar(), &unspecified, Utc::now()),
            "no requested device skips the gate"
        );
    }

    #[test]
    fn test_page_gate() {
        let mut banner = active_banner();
        banner.targeting.page_targeting = vec![PageType::Article, PageType::Category];

        let article = DeliveryContext {
            device: None,
            page_type: Some(PageType::Article),
        };
        let homepage = DeliveryContext {
            device: None,
            page_type: Some(PageType::Homepage),
        };

        assert!(eligible_for_placement(&banner, &sidebar(), &article, Utc::now()));
        assert!(!eligible_for_placement(&banner, &sidebar(), &homepage, Utc::now()));

        banner.targeting.page_targeting = vec![PageType::All];
        assert!(eligible_for_placement(&banner, &sidebar(), &homepage, Utc::now()));
    }
}

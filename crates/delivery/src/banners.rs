//! Banner inventory and delivery selection.

use crate::eligibility::eligible_for_placement;
use crate::models::{
    AuditLogFilter, BannerFilter, BannerStats, CreateBannerRequest, DeliveryContext,
    UpdateBannerRequest,
};
use crate::rotation::{apply_rotation, RotationContext};
use adpulse_core::documents::{
    AuditAction, AuditEntry, BannerRevision, EntityDocument,
};
use adpulse_core::types::{Banner, BannerStatus, RotationStrategy};
use adpulse_core::{ids, AdPulseError, AdPulseResult};
use adpulse_store::{AnalyticsStore, EntityStore};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct BannerManager {
    entities: Arc<EntityStore>,
    analytics: Arc<AnalyticsStore>,
}

impl BannerManager {
    pub fn new(entities: Arc<EntityStore>, analytics: Arc<AnalyticsStore>) -> Self {
        Self {
            entities,
            analytics,
        }
    }

    // ─── CRUD ──────────────────────────────────────────────────────────────

    /// List banners matching `filter`, highest priority first.
    pub fn all(&self, filter: &BannerFilter) -> Vec<Banner> {
        let mut banners: Vec<Banner> = self.entities.read(|doc| {
            doc.banners
                .iter()
                .filter(|b| filter.status.map_or(true, |s| b.status == s))
                .filter(|b| {
                    filter
                        .client_id
                        .as_deref()
                        .map_or(true, |c| b.client_id.as_deref() == Some(c))
                })
                .filter(|b| {
                    filter
                        .placement_id
                        .as_deref()
                        .map_or(true, |p| b.placements.iter().any(|x| x == p))
                })
                .filter(|b| {
                    filter
                        .campaign_id
                        .as_deref()
                        .map_or(true, |c| b.campaign_id.as_deref() == Some(c))
                })
                .cloned()
                .collect()
        });
        banners.sort_by(|a, b| b.priority.cmp(&a.priority));
        banners
    }

    pub fn get(&self, id: &str) -> AdPulseResult<Banner> {
        self.entities
            .read(|doc| doc.banner(id).cloned())
            .ok_or_else(|| AdPulseError::not_found("banner", id))
    }

    pub fn create(&self, req: CreateBannerRequest, user: &str) -> AdPulseResult<Banner> {
        let now = Utc::now();
        let banner = Banner {
            id: ids::generate("ban"),
            internal_id: req.internal_id,
            name: req.name,
            client_id: req.client_id,
            campaign_id: req.campaign_id,
            status: req.status,
            priority: req.priority,
            creative: req.creative,
            click: req.click,
            placements: req.placements,
            schedule: req.schedule,
            targeting: req.targeting,
            limits: req.limits,
            ab_test_group: req.ab_test_group,
            version: 1,
            created_at: now,
            updated_at: now,
            created_by: user.to_string(),
            updated_by: user.to_string(),
        };
        let stored = banner.clone();
        let user = user.to_string();
        self.entities.mutate(move |doc| {
            doc.push_audit(audit_entry(
                AuditAction::BannerCreated,
                &banner.id,
                &user,
                json!({ "name": banner.name }),
            ));
            doc.banners.push(banner);
            Ok(())
        })?;
        info!(banner_id = %stored.id, name = %stored.name, "Banner created");
        Ok(stored)
    }

    /// Update a banner. The prior state is snapshotted into the revision
    /// ring and the version bumped.
    pub fn update(&self, id: &str, req: UpdateBannerRequest, user: &str) -> AdPulseResult<Banner> {
        let now = Utc::now();
        let user = user.to_string();
        self.entities
            .mutate(move |doc| apply_patch(doc, id, req, &user, now))
    }

    pub fn delete(&self, id: &str, user: &str) -> AdPulseResult<()> {
        let user = user.to_string();
        self.entities.mutate(move |doc| {
            let banner = doc
                .banner(id)
                .cloned()
                .ok_or_else(|| AdPulseError::not_found("banner", id))?;
            doc.banners.retain(|b| b.id != id);
            doc.banner_history.remove(id);
            doc.push_audit(audit_entry(
                AuditAction::BannerDeleted,
                id,
                &user,
                json!({ "name": banner.name }),
            ));
            Ok(())
        })?;
        info!(banner_id = %id, "Banner deleted");
        Ok(())
    }

    /// Flip `active` ⇄ `paused`. Any other status is rejected rather than
    /// silently transitioned.
    pub fn toggle_status(&self, id: &str, user: &str) -> AdPulseResult<Banner> {
        let now = Utc::now();
        let user = user.to_string();
        self.entities.mutate(move |doc| {
            let current = doc
                .banner(id)
                .ok_or_else(|| AdPulseError::not_found("banner", id))?
                .status;
            let next = match current {
                BannerStatus::Active => BannerStatus::Paused,
                BannerStatus::Paused => BannerStatus::Active,
                _ => {
                    return Err(AdPulseError::Validation(
                        "only active or paused banners can be toggled".to_string(),
                    ))
                }
            };
            apply_patch(
                doc,
                id,
                UpdateBannerRequest {
                    status: Some(next),
                    ..Default::default()
                },
                &user,
                now,
            )
        })
    }

    /// Clone a banner into a fresh draft named "<name> (Copy)" with a new
    /// id, reset version, and no internal id.
    pub fn duplicate(&self, id: &str, user: &str) -> AdPulseResult<Banner> {
        let source = self.get(id)?;
        self.create(
            CreateBannerRequest {
                name: format!("{} (Copy)", source.name),
                internal_id: String::new(),
                client_id: source.client_id,
                campaign_id: source.campaign_id,
                status: BannerStatus::Draft,
                priority: source.priority,
                creative: source.creative,
                click: source.click,
                placements: source.placements,
                schedule: source.schedule,
                targeting: source.targeting,
                limits: source.limits,
                ab_test_group: source.ab_test_group,
            },
            user,
        )
    }

    /// Superseded states of a banner, newest first.
    pub fn revisions(&self, id: &str) -> AdPulseResult<Vec<BannerRevision>> {
        self.entities.read(|doc| {
            if doc.banner(id).is_none() {
                return Err(AdPulseError::not_found("banner", id));
            }
            Ok(doc
                .banner_history
                .get(id)
                .map(|ring| ring.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    // ─── Status sweep ──────────────────────────────────────────────────────

    /// Advance schedule-driven statuses: `scheduled` banners past their
    /// start date become `active`, `active` banners past their end date
    /// become `expired`. Returns the number of transitions; the document is
    /// only rewritten when there is at least one.
    pub fn update_statuses(&self) -> AdPulseResult<usize> {
        let now = Utc::now();
        let pending = self
            .entities
            .read(|doc| doc.banners.iter().any(|b| sweep_target(b, now).is_some()));
        if !pending {
            return Ok(0);
        }

        let transitioned = self.entities.mutate(|doc| {
            let mut count = 0;
            for banner in doc.banners.iter_mut() {
                if let Some(next) = sweep_target(banner, now) {
                    debug!(banner_id = %banner.id, ?next, "Status sweep transition");
                    banner.status = next;
                    banner.updated_at = now;
                    count += 1;
                }
            }
            Ok(count)
        })?;
        if transitioned > 0 {
            info!(transitioned, "Banner status sweep applied");
        }
        Ok(transitioned)
    }

    // ─── Delivery ──────────────────────────────────────────────────────────

    /// Banners to serve for a placement right now, already rotated down to
    /// the placement's slot count. Returns an empty list (never an error)
    /// when the placement is unknown or disabled, or nothing is eligible —
    /// the page simply omits the slot.
    pub fn active_banners_for_placement(
        &self,
        placement_id: &str,
        ctx: &DeliveryContext,
    ) -> Vec<Banner> {
        let now = Utc::now();
        let Some((placement, eligible)) = self.entities.read(|doc| {
            let placement = doc.placement(placement_id)?.clone();
            if !placement.enabled {
                return None;
            }
            let eligible: Vec<Banner> = doc
                .banners
                .iter()
                .filter(|b| eligible_for_placement(b, &placement, ctx, now))
                .cloned()
                .collect();
            Some((placement, eligible))
        }) else {
            return Vec::new();
        };

        // Even rotation is the only strategy that needs historical counts.
        let impressions: HashMap<String, u64> = match placement.rotation {
            RotationStrategy::Even => self.analytics.read(|doc| {
                doc.banner_totals()
                    .into_iter()
                    .map(|(id, counts)| (id, counts.impressions))
                    .collect()
            }),
            _ => HashMap::new(),
        };

        let ctx = RotationContext { now, impressions };
        apply_rotation(
            eligible,
            placement.rotation,
            placement.max_banners as usize,
            &ctx,
        )
    }

    // ─── Stats & audit ─────────────────────────────────────────────────────

    pub fn stats(&self) -> BannerStats {
        let now = Utc::now();
        let week_out = now + Duration::days(7);
        self.entities.read(|doc| {
            let by_status = |status: BannerStatus| {
                doc.banners.iter().filter(|b| b.status == status).count()
            };
            BannerStats {
                total: doc.banners.len(),
                active: by_status(BannerStatus::Active),
                paused: by_status(BannerStatus::Paused),
                draft: by_status(BannerStatus::Draft),
                expired: by_status(BannerStatus::Expired),
                scheduled: by_status(BannerStatus::Scheduled),
                expiring_soon: doc
                    .banners
                    .iter()
                    .filter(|b| b.status == BannerStatus::Active)
                    .filter(|b| {
                        b.schedule
                            .end_date
                            .is_some_and(|end| end > now && end <= week_out)
                    })
                    .count(),
                clients: doc.clients.len(),
                placements: doc.placements.len(),
            }
        })
    }

    /// Audit trail, newest first, filtered and capped per the request.
    pub fn audit_log(&self, filter: &AuditLogFilter) -> Vec<AuditEntry> {
        self.entities.read(|doc| {
            let matching = doc
                .audit_log
                .iter()
                .filter(|e| {
                    filter
                        .entity_id
                        .as_deref()
                        .map_or(true, |id| e.entity_id == id)
                })
                .filter(|e| filter.action.map_or(true, |a| e.action == a))
                .filter(|e| filter.user_id.as_deref().map_or(true, |u| e.user_id == u))
                .cloned();
            match filter.limit {
                Some(limit) => matching.take(limit).collect(),
                None => matching.collect(),
            }
        })
    }
}

// ─── Internals ─────────────────────────────────────────────────────────────

fn audit_entry(
    action: AuditAction,
    entity_id: &str,
    user_id: &str,
    details: serde_json::Value,
) -> AuditEntry {
    AuditEntry {
        id: ids::generate("log"),
        action,
        entity_id: entity_id.to_string(),
        user_id: user_id.to_string(),
        details,
        timestamp: Utc::now(),
    }
}

/// Apply an update patch in place: snapshot the prior state, merge provided
/// fields, bump the version, and record the audit entry with the changed
/// field names.
fn apply_patch(
    doc: &mut EntityDocument,
    id: &str,
    req: UpdateBannerRequest,
    user: &str,
    now: DateTime<Utc>,
) -> AdPulseResult<Banner> {
    let banner = doc
        .banner_mut(id)
        .ok_or_else(|| AdPulseError::not_found("banner", id))?;
    let previous = banner.clone();

    if let Some(name) = req.name {
        banner.name = name;
    }
    if let Some(internal_id) = req.internal_id {
        banner.internal_id = internal_id;
    }
    if let Some(client_id) = req.client_id {
        banner.client_id = Some(client_id);
    }
    if let Some(campaign_id) = req.campaign_id {
        banner.campaign_id = Some(campaign_id);
    }
    if let Some(status) = req.status {
        banner.status = status;
    }
    if let Some(priority) = req.priority {
        banner.priority = priority;
    }
    if let Some(creative) = req.creative {
        banner.creative = creative;
    }
    if let Some(click) = req.click {
        banner.click = click;
    }
    if let Some(placements) = req.placements {
        banner.placements = placements;
    }
    if let Some(schedule) = req.schedule {
        banner.schedule = schedule;
    }
    if let Some(targeting) = req.targeting {
        banner.targeting = targeting;
    }
    if let Some(limits) = req.limits {
        banner.limits = limits;
    }
    if let Some(group) = req.ab_test_group {
        banner.ab_test_group = Some(group);
    }
    banner.version = previous.version + 1;
    banner.updated_at = now;
    banner.updated_by = user.to_string();
    let updated = banner.clone();

    let changes = changed_fields(&previous, &updated);
    doc.push_revision(
        id,
        BannerRevision {
            version: previous.version,
            banner: previous,
            superseded_at: now,
        },
    );
    doc.push_audit(audit_entry(
        AuditAction::BannerUpdated,
        id,
        user,
        json!({ "name": updated.name, "changes": changes }),
    ));
    Ok(updated)
}

fn sweep_target(banner: &Banner, now: DateTime<Utc>) -> Option<BannerStatus> {
    match banner.status {
        BannerStatus::Scheduled => banner
            .schedule
            .start_date
            .filter(|start| *start <= now)
            .map(|_| BannerStatus::Active),
        BannerStatus::Active => banner
            .schedule
            .end_date
            .filter(|end| *end < now)
            .map(|_| BannerStatus::Expired),
        _ => None,
    }
}

/// Top-level JSON field names that differ between two banner states,
/// ignoring bookkeeping fields.
fn changed_fields(old: &Banner, new: &Banner) -> Vec<String> {
    const SKIP: [&str; 3] = ["version", "updatedAt", "updatedBy"];
    let (Ok(old_value), Ok(new_value)) = (serde_json::to_value(old), serde_json::to_value(new))
    else {
        return Vec::new();
    };
    let (Some(old_map), Some(new_map)) = (old_value.as_object(), new_value.as_object()) else {
        return Vec::new();
    };
    old_map
        .keys()
        .filter(|key| !SKIP.contains(&key.as_str()))
        .filter(|key| old_map.get(*key) != new_map.get(*key))
        .cloned()
        .collect()
}

// ─── Tests ─────────────────────────────────────────────────────────────────

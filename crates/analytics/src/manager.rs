//! Event recording, retention cleanup, and the frequency-cap query.

use crate::models::{CleanupReport, RecordEventRequest};
use adpulse_core::documents::{date_key, Counts, TrackedEvent, EVENT_BUFFER_CAP};
use adpulse_core::{ids, AdPulseResult};
use adpulse_store::{AnalyticsStore, EntityStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Impression,
    Click,
}

impl EventKind {
    fn id_prefix(self) -> &'static str {
        match self {
            EventKind::Impression => "imp",
            EventKind::Click => "clk",
        }
    }
}

pub struct AnalyticsManager {
    pub(crate) analytics: Arc<AnalyticsStore>,
    pub(crate) entities: Arc<EntityStore>,
}

impl AnalyticsManager {
    pub fn new(analytics: Arc<AnalyticsStore>, entities: Arc<EntityStore>) -> Self {
        Self {
            analytics,
            entities,
        }
    }

    /// Record an impression: prepend to the capped event ring and fold into
    /// today's rollup bucket (day total, banner, and — when present —
    /// placement and client sub-buckets). Returns the stored event.
    pub fn record_impression(&self, req: RecordEventRequest) -> AdPulseResult<TrackedEvent> {
        self.record(EventKind::Impression, req)
    }

    /// Record a click. Same rollup fold as impressions, against the click
    /// counters.
    pub fn record_click(&self, req: RecordEventRequest) -> AdPulseResult<TrackedEvent> {
        self.record(EventKind::Click, req)
    }

    fn record(&self, kind: EventKind, req: RecordEventRequest) -> AdPulseResult<TrackedEvent> {
        let now = Utc::now();
        let key = date_key(now);
        let event = TrackedEvent {
            id: ids::generate(kind.id_prefix()),
            banner_id: req.banner_id,
            placement_id: req.placement_id,
            client_id: req.client_id,
            campaign_id: req.campaign_id,
            timestamp: now,
            page_url: req.page_url,
            page_type: req.page_type,
            target_url: req.target_url,
            referrer: req.referrer,
            session_id: req.session_id,
            user_agent: req.user_agent,
            device: if req.device.is_empty() {
                "unknown".to_string()
            } else {
                req.device
            },
            viewport: req.viewport,
            country: req.country,
            region: req.region,
        };

        self.analytics.mutate(move |doc| {
            let ring = match kind {
                EventKind::Impression => &mut doc.impressions,
                EventKind::Click => &mut doc.clicks,
            };
            ring.push_front(event.clone());
            ring.truncate(EVENT_BUFFER_CAP);

            let bucket = doc.day_mut(&key);
            let bump = |counts: &mut Counts| match kind {
                EventKind::Impression => counts.impressions += 1,
                EventKind::Click => counts.clicks += 1,
            };
            match kind {
                EventKind::Impression => bucket.impressions += 1,
                EventKind::Click => bucket.clicks += 1,
            }
            bump(bucket.banners.entry(event.banner_id.clone()).or_default());
            if let Some(placement_id) = &event.placement_id {
                bump(bucket.placements.entry(placement_id.clone()).or_default());
            }
            if let Some(client_id) = &event.client_id {
                bump(bucket.clients.entry(client_id.clone()).or_default());
            }
            Ok(event)
        })
    }

    /// Drop rollup days and buffered events older than `days_to_keep`.
    /// Running it again immediately removes nothing.
    pub fn cleanup_old_data(&self, days_to_keep: u32) -> AdPulseResult<CleanupReport> {
        let now = Utc::now();
        let cutoff = now - Duration::days(days_to_keep as i64);
        let cutoff_key = date_key(cutoff);

        let report = self.analytics.mutate(|doc| {
            let days_before = doc.daily_stats.len();
            doc.daily_stats
                .retain(|key, _| key.as_str() >= cutoff_key.as_str());
            let events_before = doc.impressions.len() + doc.clicks.len();
            doc.impressions.retain(|e| e.timestamp >= cutoff);
            doc.clicks.retain(|e| e.timestamp >= cutoff);
            doc.last_cleanup = now;
            Ok(CleanupReport {
                cutoff_date: cutoff_key.clone(),
                removed_days: days_before - doc.daily_stats.len(),
                removed_events: events_before - (doc.impressions.len() + doc.clicks.len()),
            })
        })?;
        info!(
            cutoff = %report.cutoff_date,
            removed_days = report.removed_days,
            removed_events = report.removed_events,
            "Analytics retention cleanup"
        );
        Ok(report)
    }

    /// Whether the banner may be shown to this session again today.
    ///
    /// Counts only the buffered impression ring (most recent
    /// [`EVENT_BUFFER_CAP`] events), not the full rollup: under very high
    /// traffic, same-day impressions that rolled out of the buffer are not
    /// counted. Known sampling bound, kept for its constant memory and
    /// predictable cost.
    pub fn check_frequency_cap(&self, banner_id: &str, session_id: &str, max_per_day: u32) -> bool {
        let today = date_key(Utc::now());
        let shown_today = self.analytics.read(|doc| {
            doc.impressions
                .iter()
                .filter(|i| i.banner_id == banner_id && i.session_id == session_id)
                .filter(|i| date_key(i.timestamp) == today)
                .count()
        });
        (shown_today as u32) < max_per_day
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

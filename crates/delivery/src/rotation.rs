//! Rotation strategies — how eligible banners fill a placement's slots.

use adpulse_core::types::{Banner, RotationStrategy};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Inputs the strategies need beyond the candidate list itself.
pub struct RotationContext {
    pub now: DateTime<Utc>,
    /// Lifetime impressions per banner id; read by `even` rotation only.
    pub impressions: HashMap<String, u64>,
}

impl RotationContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            impressions: HashMap::new(),
        }
    }
}

/// Select at most `max_banners` from `banners` according to `strategy`.
///
/// - `weighted`: priority descending; ties keep filter order (stable sort).
/// - `random`: uniform shuffle.
/// - `sequential`: a minute-granularity rotating window over the candidate
///   list. All requests within the same minute see the same window; this is
///   deliberately not a per-request round robin.
/// - `even`: least-shown first, by lifetime impression counts.
pub fn apply_rotation(
    mut banners: Vec<Banner>,
    strategy: RotationStrategy,
    max_banners: usize,
    ctx: &RotationContext,
) -> Vec<Banner> {
    if banners.is_empty() {
        return banners;
    }

    match strategy {
        RotationStrategy::Weighted => {
            banners.sort_by(|a, b| b.priority.cmp(&a.priority));
            banners.truncate(max_banners);
            banners
        }
        RotationStrategy::Random => {
            banners.shuffle(&mut rand::thread_rng());
            banners.truncate(max_banners);
            banners
        }
        RotationStrategy::Sequential => {
            let len = banners.len();
            let index = (ctx.now.timestamp_millis() / 60_000).rem_euclid(len as i64) as usize;
            (0..max_banners.min(len))
                .map(|i| banners[(index + i) % len].clone())
                .collect()
        }
        RotationStrategy::Even => {
            banners.sort_by_key(|b| ctx.impressions.get(&b.id).copied().unwrap_or(0));
            banners.truncate(max_banners);
            banners
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

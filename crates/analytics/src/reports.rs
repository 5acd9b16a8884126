//! Reporting: dashboard summary, per-entity reports, CSV export.

use crate::manager::AnalyticsManager;
use crate::models::*;
use adpulse_core::documents::{ctr_string, date_key, Counts, DayBucket};
use adpulse_core::types::{Banner, BannerStatus};
use adpulse_core::{AdPulseError, AdPulseResult};
use chrono::{Duration, NaiveDate, Utc};

impl AnalyticsManager {
    /// Rolling dashboard view: today / 7-day / 30-day windows, top and
    /// underperforming banners, upcoming expirations, entity counts.
    pub fn dashboard_summary(&self) -> DashboardSummary {
        let now = Utc::now();
        let today_key = date_key(now);

        let (today, week_daily, month_daily, lifetime) = self.analytics.read(|doc| {
            let today = doc
                .day(&today_key)
                .map(|b| Counts {
                    impressions: b.impressions,
                    clicks: b.clicks,
                })
                .unwrap_or_default();
            let series = |days: i64| {
                let mut daily: Vec<DailyPoint> = (0..days)
                    .map(|i| {
                        let key = date_key(now - Duration::days(i));
                        let (impressions, clicks) = doc
                            .day(&key)
                            .map(|b| (b.impressions, b.clicks))
                            .unwrap_or((0, 0));
                        DailyPoint {
                            ctr: ctr_string(impressions, clicks),
                            date: key,
                            impressions,
                            clicks,
                        }
                    })
                    .collect();
                daily.reverse();
                daily
            };
            (today, series(7), series(30), doc.banner_totals())
        });

        let (banners, total_clients, total_placements) = self
            .entities
            .read(|doc| (doc.banners.clone(), doc.clients.len(), doc.placements.len()));

        let mut top_banners: Vec<BannerPerformance> = lifetime
            .iter()
            .filter_map(|(id, counts)| {
                let banner = banners.iter().find(|b| &b.id == id)?;
                Some(BannerPerformance {
                    id: id.clone(),
                    banner: banner.clone(),
                    impressions: counts.impressions,
                    clicks: counts.clicks,
                    ctr: ctr_string(counts.impressions, counts.clicks),
                })
            })
            .collect();
        top_banners.sort_by(|a, b| b.impressions.cmp(&a.impressions));
        top_banners.truncate(5);

        let week_out = now + Duration::days(7);
        let mut expiring_banners: Vec<Banner> = banners
            .iter()
            .filter(|b| b.status == BannerStatus::Active)
            .filter(|b| {
                b.schedule
                    .end_date
                    .is_some_and(|end| end > now && end <= week_out)
            })
            .cloned()
            .collect();
        expiring_banners.sort_by_key(|b| b.schedule.end_date);

        let mut underperforming: Vec<(f64, BannerPerformance)> = lifetime
            .iter()
            .filter_map(|(id, counts)| {
                let banner = banners.iter().find(|b| &b.id == id)?;
                if banner.status != BannerStatus::Active || counts.impressions <= 100 {
                    return None;
                }
                let rate = counts.clicks as f64 / counts.impressions as f64 * 100.0;
                if rate >= 0.5 {
                    return None;
                }
                Some((
                    rate,
                    BannerPerformance {
                        id: id.clone(),
                        banner: banner.clone(),
                        impressions: counts.impressions,
                        clicks: counts.clicks,
                        ctr: ctr_string(counts.impressions, counts.clicks),
                    },
                ))
            })
            .collect();
        underperforming.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let underperforming_banners: Vec<BannerPerformance> = underperforming
            .into_iter()
            .take(5)
            .map(|(_, perf)| perf)
            .collect();

        let sum = |daily: &[DailyPoint]| {
            daily.iter().fold((0u64, 0u64), |(imps, clicks), point| {
                (imps + point.impressions, clicks + point.clicks)
            })
        };
        let (week_impressions, week_clicks) = sum(&week_daily);
        let (month_impressions, month_clicks) = sum(&month_daily);

        DashboardSummary {
            today: WindowTotals {
                impressions: today.impressions,
                clicks: today.clicks,
                ctr: ctr_string(today.impressions, today.clicks),
            },
            week: WindowSeries {
                impressions: week_impressions,
                clicks: week_clicks,
                ctr: ctr_string(week_impressions, week_clicks),
                daily: week_daily,
            },
            month: WindowSeries {
                impressions: month_impressions,
                clicks: month_clicks,
                ctr: ctr_string(month_impressions, month_clicks),
                daily: month_daily,
            },
            top_banners,
            expiring_banners,
            underperforming_banners,
            active_banners: banners
                .iter()
                .filter(|b| b.status == BannerStatus::Active)
                .count(),
            total_banners: banners.len(),
            total_clients,
            total_placements,
        }
    }

    /// Daily performance of one banner over `[start, end]` inclusive.
    pub fn banner_report(
        &self,
        banner_id: &str,
        start: &str,
        end: &str,
    ) -> AdPulseResult<BannerReport> {
        let banner = self
            .entities
            .read(|doc| doc.banner(banner_id).cloned())
            .ok_or_else(|| AdPulseError::not_found("banner", banner_id))?;
        let (daily, totals) = self.series_between(start, end, |bucket| {
            bucket.banners.get(banner_id).copied().unwrap_or_default()
        })?;
        Ok(BannerReport {
            banner,
            period: Period {
                start: start.to_string(),
                end: end.to_string(),
            },
            totals,
            daily,
        })
    }

    pub fn placement_report(
        &self,
        placement_id: &str,
        start: &str,
        end: &str,
    ) -> AdPulseResult<PlacementReport> {
        let placement = self
            .entities
            .read(|doc| doc.placement(placement_id).cloned())
            .ok_or_else(|| AdPulseError::not_found("placement", placement_id))?;
        let (daily, totals) = self.series_between(start, end, |bucket| {
            bucket
                .placements
                .get(placement_id)
                .copied()
                .unwrap_or_default()
        })?;
        Ok(PlacementReport {
            placement,
            period: Period {
                start: start.to_string(),
                end: end.to_string(),
            },
            totals,
            daily,
        })
    }

    /// Client-level report, with a per-banner breakdown over the same
    /// window.
    pub fn client_report(
        &self,
        client_id: &str,
        start: &str,
        end: &str,
    ) -> AdPulseResult<ClientReport> {
        let (client, client_banners) = self
            .entities
            .read(|doc| {
                let client = doc.client(client_id).cloned()?;
                let banners: Vec<Banner> = doc
                    .banners
                    .iter()
                    .filter(|b| b.client_id.as_deref() == Some(client_id))
                    .cloned()
                    .collect();
                Some((client, banners))
            })
            .ok_or_else(|| AdPulseError::not_found("client", client_id))?;

        let (daily, totals) = self.series_between(start, end, |bucket| {
            bucket.clients.get(client_id).copied().unwrap_or_default()
        })?;

        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;
        let banners = self.analytics.read(|doc| {
            client_banners
                .into_iter()
                .map(|banner| {
                    let mut total = Counts::default();
                    let mut day = start_date;
                    while day <= end_date {
                        let key = day.format("%Y-%m-%d").to_string();
                        if let Some(counts) = doc.day(&key).and_then(|b| b.banners.get(&banner.id))
                        {
                            total.impressions += counts.impressions;
                            total.clicks += counts.clicks;
                        }
                        match day.succ_opt() {
                            Some(next) => day = next,
                            None => break,
                        }
                    }
                    ClientBannerPerformance {
                        period_impressions: total.impressions,
                        period_clicks: total.clicks,
                        period_ctr: ctr_string(total.impressions, total.clicks),
                        banner,
                    }
                })
                .collect()
        });

        Ok(ClientReport {
            client,
            period: Period {
                start: start.to_string(),
                end: end.to_string(),
            },
            totals,
            daily,
            banners,
        })
    }

    /// One CSV row per day of the corresponding report.
    pub fn export_csv(
        &self,
        report_type: ReportType,
        entity_id: &str,
        start: &str,
        end: &str,
    ) -> AdPulseResult<String> {
        let daily = match report_type {
            ReportType::Banner => self.banner_report(entity_id, start, end)?.daily,
            ReportType::Placement => self.placement_report(entity_id, start, end)?.daily,
            ReportType::Client => self.client_report(entity_id, start, end)?.daily,
        };
        let mut lines = Vec::with_capacity(daily.len() + 1);
        lines.push("Date,Impressions,Clicks,CTR (%)".to_string());
        for point in daily {
            lines.push(format!(
                "{},{},{},{}",
                point.date, point.impressions, point.clicks, point.ctr
            ));
        }
        Ok(lines.join("\n"))
    }

    fn series_between(
        &self,
        start: &str,
        end: &str,
        select: impl Fn(&DayBucket) -> Counts,
    ) -> AdPulseResult<(Vec<DailyPoint>, ReportTotals)> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;
        Ok(self.analytics.read(|doc| {
            let mut daily = Vec::new();
            let mut total = Counts::default();
            let mut day = start_date;
            while day <= end_date {
                let key = day.format("%Y-%m-%d").to_string();
                let counts = doc.day(&key).map(|b| select(b)).unwrap_or_default();
                total.impressions += counts.impressions;
                total.clicks += counts.clicks;
                daily.push(DailyPoint {
                    ctr: ctr_string(counts.impressions, counts.clicks),
                    date: key,
                    impressions: counts.impressions,
                    clicks: counts.clicks,
                });
                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }
            (
                daily,
                ReportTotals {
                    impressions: total.impressions,
                    clicks: total.clicks,
                    ctr: ctr_string(total.impressions, total.clicks),
                },
            )
        }))
    }
}

fn parse_date(s: &str) -> AdPulseResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AdPulseError::Validation(format!("invalid date: {s} (expected YYYY-MM-DD)")))
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordEventRequest;
    use adpulse_store::{AnalyticsStore, EntityStore};
    use chrono::Utc;
    use std::sync::Arc;

    fn manager() -> (
        AnalyticsManager,
        Arc<AnalyticsStore>,
        Arc<EntityStore>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let entities = Arc::new(EntityStore::open(dir.path().join("banners.json")).unwrap());
        let analytics = Arc::new(AnalyticsStore::open(dir.path().join("analytics.json")).unwrap());
        (
            AnalyticsManager::new(analytics.clone(), entities.clone()),
            analytics,
            entities,
            dir,
        )
    }

    fn seed_banner(
        entities: &EntityStore,
        id: &str,
        status: BannerStatus,
        client_id: Option<&str>,
        end_date: Option<chrono::DateTime<Utc>>,
    ) {
        let id = id.to_string();
        let client_id = client_id.map(str::to_string);
        entities
            .mutate(move |doc| {
                let now = Utc::now();
                doc.banners.push(Banner {
                    id: id.clone(),
                    internal_id: String::new(),
                    name: id.clone(),
                    client_id,
                    campaign_id: None,
                    status,
                    priority: 5,
                    creative: Default::default(),
                    click: Default::default(),
                    placements: vec![],
                    schedule: adpulse_core::types::Schedule {
                        start_date: None,
                        end_date,
                        time_windows: vec![],
                    },
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
    }

    fn seed_client(entities: &EntityStore, id: &str) {
        let id = id.to_string();
        entities
            .mutate(move |doc| {
                let now = Utc::now();
                doc.clients.push(adpulse_core::types::Client {
                    id: id.clone(),
                    name: id.clone(),
                    company: String::new(),
                    email: String::new(),
                    phone: String::new(),
                    website: String::new(),
                    address: String::new(),
                    contact: Default::default(),
                    status: Default::default(),
                    tier: Default::default(),
                    billing: Default::default(),
                    notes: String::new(),
                    tags: vec![],
                    created_at: now,
                    updated_at: now,
                });
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_banner_report_fixed_window() {
        let (manager, analytics, entities, _dir) = manager();
        seed_banner(&entities, "ban_x", BannerStatus::Active, None, None);
        analytics
            .mutate(|doc| {
                let bucket = doc.day_mut("2024-01-01");
                bucket.impressions = 3;
                bucket.clicks = 1;
                bucket.banners.insert(
                    "ban_x".into(),
                    Counts {
                        impressions: 3,
                        clicks: 1,
                    },
                );
                Ok(())
            })
            .unwrap();

        let report = manager
            .banner_report("ban_x", "2024-01-01", "2024-01-01")
            .unwrap();
        assert_eq!(report.totals.impressions, 3);
        assert_eq!(report.totals.clicks, 1);
        assert_eq!(report.totals.ctr, "33.33");
        assert_eq!(report.daily.len(), 1);
        assert_eq!(report.daily[0].date, "2024-01-01");
    }

    #[test]
    fn test_report_totals_equal_daily_sum() {
        let (manager, analytics, entities, _dir) = manager();
        seed_banner(&entities, "ban_x", BannerStatus::Active, None, None);
        analytics
            .mutate(|doc| {
                doc.day_mut("2024-01-01").banners.insert(
                    "ban_x".into(),
                    Counts {
                        impressions: 10,
                        clicks: 1,
                    },
                );
                doc.day_mut("2024-01-03").banners.insert(
                    "ban_x".into(),
                    Counts {
                        impressions: 20,
                        clicks: 4,
                    },
                );
                Ok(())
            })
            .unwrap();

        let report = manager
            .banner_report("ban_x", "2024-01-01", "2024-01-04")
            .unwrap();
        assert_eq!(report.daily.len(), 4, "every calendar day appears");
        let impressions: u64 = report.daily.iter().map(|d| d.impressions).sum();
        let clicks: u64 = report.daily.iter().map(|d| d.clicks).sum();
        assert_eq!(report.totals.impressions, impressions);
        assert_eq!(report.totals.clicks, clicks);
        assert_eq!(report.daily[1].impressions, 0, "gap days are zero");
    }

    #[test]
    fn test_report_unknown_entities() {
        let (manager, _, _, _dir) = manager();
        assert!(matches!(
            manager.banner_report("ban_ghost", "2024-01-01", "2024-01-02"),
            Err(AdPulseError::NotFound { .. })
        ));
        assert!(matches!(
            manager.placement_report("plc_ghost", "2024-01-01", "2024-01-02"),
            Err(AdPulseError::NotFound { .. })
        ));
        assert!(matches!(
            manager.client_report("cli_ghost", "2024-01-01", "2024-01-02"),
            Err(AdPulseError::NotFound { .. })
        ));
    }

    #[test]
    fn test_export_csv_matches_report() {
        let (manager, analytics, entities, _dir) = manager();
        seed_banner(&entities, "ban_x", BannerStatus::Active, None, None);
        analytics
            .mutate(|doc| {
                let bucket = doc.day_mut("2024-01-01");
                bucket.banners.insert(
                    "ban_x".into(),
                    Counts {
                        impressions: 3,
                        clicks: 1,
                    },
                );
                Ok(())
            })
            .unwrap();

        let csv = manager
            .export_csv(ReportType::Banner, "ban_x", "2024-01-01", "2024-01-01")
            .unwrap();
        assert_eq!(csv, "Date,Impressions,Clicks,CTR (%)\n2024-01-01,3,1,33.33");
    }

    #[test]
    fn test_unknown_report_type_is_unsupported() {
        let err = "weird".parse::<ReportType>().unwrap_err();
        assert!(matches!(err, AdPulseError::Unsupported(_)));
        assert_eq!("banner".parse::<ReportType>().unwrap(), ReportType::Banner);
    }

    #[test]
    fn test_client_report_breaks_down_per_banner() {
        let (manager, analytics, entities, _dir) = manager();
        seed_client(&entities, "cli_1");
        seed_banner(&entities, "ban_a", BannerStatus::Active, Some("cli_1"), None);
        seed_banner(&entities, "ban_b", BannerStatus::Active, Some("cli_1"), None);
        analytics
            .mutate(|doc| {
                let bucket = doc.day_mut("2024-01-02");
                bucket.clients.insert(
                    "cli_1".into(),
                    Counts {
                        impressions: 30,
                        clicks: 3,
                    },
                );
                bucket.banners.insert(
                    "ban_a".into(),
                    Counts {
                        impressions: 20,
                        clicks: 2,
                    },
                );
                bucket.banners.insert(
                    "ban_b".into(),
                    Counts {
                        impressions: 10,
                        clicks: 1,
                    },
                );
                Ok(())
            })
            .unwrap();

        let report = manager
            .client_report("cli_1", "2024-01-01", "2024-01-03")
            .unwrap();
        assert_eq!(report.totals.impressions, 30);
        assert_eq!(report.banners.len(), 2);
        let a = report
            .banners
            .iter()
            .find(|b| b.banner.id == "ban_a")
            .unwrap();
        assert_eq!(a.period_impressions, 20);
        assert_eq!(a.period_ctr, "10.00");
    }

    #[test]
    fn test_live_recording_feeds_todays_report() {
        let (manager, _, entities, _dir) = manager();
        seed_banner(&entities, "ban_x", BannerStatus::Active, None, None);
        for _ in 0..3 {
            manager
                .record_impression(RecordEventRequest {
                    banner_id: "ban_x".into(),
                    ..Default::default()
                })
                .unwrap();
        }
        manager
            .record_click(RecordEventRequest {
                banner_id: "ban_x".into(),
                ..Default::default()
            })
            .unwrap();

        let today = date_key(Utc::now());
        let report = manager.banner_report("ban_x", &today, &today).unwrap();
        assert_eq!(report.totals.impressions, 3);
        assert_eq!(report.totals.clicks, 1);
        assert_eq!(report.totals.ctr, "33.33");

        let csv = manager
            .export_csv(ReportType::Banner, "ban_x", &today, &today)
            .unwrap();
        assert_eq!(
            csv,
            format!("Date,Impressions,Clicks,CTR (%)\n{today},3,1,33.33")
        );
    }

    #[test]
    fn test_dashboard_summary_windows_and_highlights() {
        let (manager, analytics, entities, _dir) = manager();
        let now = Utc::now();

        seed_banner(&entities, "ban_top", BannerStatus::Active, None, None);
        seed_banner(
            &entities,
            "ban_expiring",
            BannerStatus::Active,
            None,
            Some(now + Duration::days(2)),
        );
        seed_banner(&entities, "ban_weak", BannerStatus::Active, None, None);

        analytics
            .mutate(move |doc| {
                let today = date_key(now);
                let bucket = doc.day_mut(&today);
                bucket.impressions = 1_500;
                bucket.clicks = 32;
                bucket.banners.insert(
                    "ban_top".into(),
                    Counts {
                        impressions: 1_000,
                        clicks: 30,
                    },
                );
                bucket.banners.insert(
                    "ban_weak".into(),
                    Counts {
                        impressions: 500,
                        clicks: 1,
                    },
                );
                // A day outside the 7-day window still counts for lifetime
                // figures.
                let old = date_key(now - Duration::days(10));
                doc.day_mut(&old).banners.insert(
                    "ban_top".into(),
                    Counts {
                        impressions: 100,
                        clicks: 0,
                    },
                );
                Ok(())
            })
            .unwrap();

        let summary = manager.dashboard_summary();
        assert_eq!(summary.today.impressions, 1_500);
        assert_eq!(summary.week.daily.len(), 7);
        assert_eq!(summary.month.daily.len(), 30);
        assert_eq!(
            summary.week.daily.last().unwrap().date,
            date_key(now),
            "series is chronological, today last"
        );

        assert_eq!(summary.top_banners[0].id, "ban_top");
        assert_eq!(summary.top_banners[0].impressions, 1_100);

        assert_eq!(summary.expiring_banners.len(), 1);
        assert_eq!(summary.expiring_banners[0].id, "ban_expiring");

        assert_eq!(summary.underperforming_banners.len(), 1);
        assert_eq!(summary.underperforming_banners[0].id, "ban_weak");

        assert_eq!(summary.active_banners, 3);
        assert_eq!(summary.total_placements, 7);
    }
}

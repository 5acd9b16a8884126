//! Campaigns — CRUD with client validation, delete guards, goal tracking.

use crate::models::{CampaignStats, CreateCampaignRequest, UpdateCampaignRequest};
use adpulse_core::documents::ctr_string;
use adpulse_core::types::{Banner, BannerStatus, Campaign};
use adpulse_core::{ids, AdPulseError, AdPulseResult};
use adpulse_store::{AnalyticsStore, EntityStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct CampaignManager {
    entities: Arc<EntityStore>,
    analytics: Arc<AnalyticsStore>,
}

impl CampaignManager {
    pub fn new(entities: Arc<EntityStore>, analytics: Arc<AnalyticsStore>) -> Self {
        Self {
            entities,
            analytics,
        }
    }

    pub fn all(&self) -> Vec<Campaign> {
        self.entities.read(|doc| doc.campaigns.clone())
    }

    pub fn get(&self, id: &str) -> AdPulseResult<Campaign> {
        self.entities
            .read(|doc| doc.campaign(id).cloned())
            .ok_or_else(|| AdPulseError::not_found("campaign", id))
    }

    /// Create a campaign. The owning client must exist.
    pub fn create(&self, req: CreateCampaignRequest) -> AdPulseResult<Campaign> {
        let now = Utc::now();
        let campaign = Campaign {
            id: ids::generate("cam"),
            client_id: req.client_id,
            name: req.name,
            description: req.description,
            status: req.status,
            budget: req.budget,
            budget_type: req.budget_type,
            spent_amount: 0.0,
            start_date: req.start_date,
            end_date: req.end_date,
            impression_goal: req.impression_goal,
            click_goal: req.click_goal,
            default_page_targeting: req.default_page_targeting,
            default_device_targeting: req.default_device_targeting,
            created_at: now,
            updated_at: now,
        };
        let stored = campaign.clone();
        self.entities.mutate(move |doc| {
            if doc.client(&campaign.client_id).is_none() {
                return Err(AdPulseError::Validation(format!(
                    "campaign references unknown client {}",
                    campaign.client_id
                )));
            }
            doc.campaigns.push(campaign);
            Ok(())
        })?;
        info!(campaign_id = %stored.id, name = %stored.name, "Campaign created");
        Ok(stored)
    }

    pub fn update(&self, id: &str, req: UpdateCampaignRequest) -> AdPulseResult<Campaign> {
        self.entities.mutate(|doc| {
            let campaign = doc
                .campaign_mut(id)
                .ok_or_else(|| AdPulseError::not_found("campaign", id))?;
            if let Some(name) = req.name {
                campaign.name = name;
            }
            if let Some(description) = req.description {
                campaign.description = description;
            }
            if let Some(status) = req.status {
                campaign.status = status;
            }
            if let Some(budget) = req.budget {
                campaign.budget = Some(budget);
            }
            if let Some(budget_type) = req.budget_type {
                campaign.budget_type = budget_type;
            }
            if let Some(spent) = req.spent_amount {
                campaign.spent_amount = spent;
            }
            if let Some(start) = req.start_date {
                campaign.start_date = Some(start);
            }
            if let Some(end) = req.end_date {
                campaign.end_date = Some(end);
            }
            if let Some(goal) = req.impression_goal {
                campaign.impression_goal = Some(goal);
            }
            if let Some(goal) = req.click_goal {
                campaign.click_goal = Some(goal);
            }
            if let Some(pages) = req.default_page_targeting {
                campaign.default_page_targeting = pages;
            }
            if let Some(device) = req.default_device_targeting {
                campaign.default_device_targeting = device;
            }
            campaign.updated_at = Utc::now();
            Ok(campaign.clone())
        })
    }

    /// Delete a campaign. Refused while the campaign still owns active
    /// banners.
    pub fn delete(&self, id: &str) -> AdPulseResult<()> {
        self.entities.mutate(|doc| {
            if doc.campaign(id).is_none() {
                return Err(AdPulseError::not_found("campaign", id));
            }
            let active = doc
                .banners
                .iter()
                .filter(|b| {
                    b.campaign_id.as_deref() == Some(id) && b.status == BannerStatus::Active
                })
                .count();
            if active > 0 {
                return Err(AdPulseError::ReferentialIntegrity(format!(
                    "cannot delete campaign with {active} active banner(s)"
                )));
            }
            doc.campaigns.retain(|c| c.id != id);
            Ok(())
        })?;
        info!(campaign_id = %id, "Campaign deleted");
        Ok(())
    }

    pub fn banners(&self, campaign_id: &str) -> Vec<Banner> {
        self.entities.read(|doc| {
            doc.banners
                .iter()
                .filter(|b| b.campaign_id.as_deref() == Some(campaign_id))
                .cloned()
                .collect()
        })
    }

    /// Performance summary across the campaign's banners, with goal
    /// progress percentages when goals are set.
    pub fn stats(&self, campaign_id: &str) -> AdPulseResult<CampaignStats> {
        let (campaign, banners) = self.entities.read(|doc| {
            let campaign = doc
                .campaign(campaign_id)
                .cloned()
                .ok_or_else(|| AdPulseError::not_found("campaign", campaign_id))?;
            let banners: Vec<Banner> = doc
                .banners
                .iter()
                .filter(|b| b.campaign_id.as_deref() == Some(campaign_id))
                .cloned()
                .collect();
            Ok::<_, AdPulseError>((campaign, banners))
        })?;

        let totals = self.analytics.read(|doc| doc.banner_totals());
        let mut impressions = 0;
        let mut clicks = 0;
        for banner in &banners {
            if let Some(counts) = totals.get(&banner.id) {
                impressions += counts.impressions;
                clicks += counts.clicks;
            }
        }

        let impression_progress = campaign
            .impression_goal
            .filter(|goal| *goal > 0)
            .map(|goal| format!("{:.1}", impressions as f64 / goal as f64 * 100.0));
        let click_progress = campaign
            .click_goal
            .filter(|goal| *goal > 0)
            .map(|goal| format!("{:.1}", clicks as f64 / goal as f64 * 100.0));

        Ok(CampaignStats {
            total_banners: banners.len(),
            active_banners: banners
                .iter()
                .filter(|b| b.status == BannerStatus::Active)
                .count(),
            total_impressions: impressions,
            total_clicks: clicks,
            ctr: ctr_string(impressions, clicks),
            impression_progress,
            click_progress,
            campaign,
        })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientManager;
    use crate::models::CreateClientRequest;
    use adpulse_core::documents::Counts;

    struct Fixture {
        campaigns: CampaignManager,
        clients: ClientManager,
        entities: Arc<EntityStore>,
        analytics: Arc<AnalyticsStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let entities = Arc::new(EntityStore::open(dir.path().join("banners.json")).unwrap());
        let analytics = Arc::new(AnalyticsStore::open(dir.path().join("analytics.json")).unwrap());
        Fixture {
            campaigns: CampaignManager::new(entities.clone(), analytics.clone()),
            clients: ClientManager::new(entities.clone(), analytics.clone()),
            entities,
            analytics,
            _dir: dir,
        }
    }

    fn campaign_req(name: &str, client_id: &str) -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: name.to_string(),
            client_id: client_id.to_string(),
            description: String::new(),
            status: Default::default(),
            budget: None,
            budget_type: Default::default(),
            start_date: None,
            end_date: None,
            impression_goal: None,
            click_goal: None,
            default_page_targeting: vec![adpulse_core::types::PageType::All],
            default_device_targeting: Default::default(),
        }
    }

    fn seed_client(fx: &Fixture) -> String {
        fx.clients
            .create(CreateClientRequest {
                name: "Acme".into(),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_create_requires_existing_client() {
        let fx = fixture();
        let err = fx
            .campaigns
            .create(campaign_req("Q3 Push", "cli_missing"))
            .unwrap_err();
        assert!(matches!(err, AdPulseError::Validation(_)));
        assert!(fx.campaigns.all().is_empty(), "store unchanged");
    }

    #[test]
    fn test_create_and_spent_amount_starts_zero() {
        let fx = fixture();
        let client_id = seed_client(&fx);
        let campaign = fx
            .campaigns
            .create(campaign_req("Q3 Push", &client_id))
            .unwrap();
        assert!(campaign.id.starts_with("cam_"));
        assert_eq!(campaign.spent_amount, 0.0);
    }

    #[test]
    fn test_delete_blocked_by_active_banner() {
        let fx = fixture();
        let client_id = seed_client(&fx);
        let campaign = fx
            .campaigns
            .create(campaign_req("Q3 Push", &client_id))
            .unwrap();

        let campaign_id = campaign.id.clone();
        fx.entities
            .mutate(move |doc| {
                let now = Utc::now();
                doc.banners.push(Banner {
                    id: "ban_1".into(),
                    internal_id: String::new(),
                    name: "Live".into(),
                    client_id: None,
                    campaign_id: Some(campaign_id),
                    status: BannerStatus::Active,
                    priority: 5,
                    creative: Default::default(),
                    click: Default::default(),
                    placements: vec![],
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

        let err = fx.campaigns.delete(&campaign.id).unwrap_err();
        assert!(matches!(err, AdPulseError::ReferentialIntegrity(_)));
        assert!(fx.campaigns.get(&campaign.id).is_ok());
    }

    #[test]
    fn test_stats_goal_progress() {
        let fx = fixture();
        let client_id = seed_client(&fx);
        let mut req = campaign_req("Q3 Push", &client_id);
        req.impression_goal = Some(1000);
        req.click_goal = Some(50);
        let campaign = fx.campaigns.create(req).unwrap();

        let campaign_id = campaign.id.clone();
        fx.entities
            .mutate(move |doc| {
                let now = Utc::now();
                doc.banners.push(Banner {
                    id: "ban_1".into(),
                    internal_id: String::new(),
                    name: "Live".into(),
                    client_id: None,
                    campaign_id: Some(campaign_id),
                    status: BannerStatus::Active,
                    priority: 5,
                    creative: Default::default(),
                    click: Default::default(),
                    placements: vec![],
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
        fx.analytics
            .mutate(|doc| {
                doc.day_mut("2024-02-01").banners.insert(
                    "ban_1".into(),
                    Counts {
                        impressions: 250,
                        clicks: 10,
                    },
                );
                Ok(())
            })
            .unwrap();

        let stats = fx.campaigns.stats(&campaign.id).unwrap();
        assert_eq!(stats.impression_progress.as_deref(), Some("25.0"));
        assert_eq!(stats.click_progress.as_deref(), Some("20.0"));
        assert_eq!(stats.ctr, "4.00");
    }
}

//! Advertiser accounts — CRUD and rollup-backed performance stats.

use crate::models::{ClientStats, CreateClientRequest, UpdateClientRequest};
use adpulse_core::documents::ctr_string;
use adpulse_core::types::{Banner, BannerStatus, Campaign, CampaignStatus, Client};
use adpulse_core::{ids, AdPulseError, AdPulseResult};
use adpulse_store::{AnalyticsStore, EntityStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct ClientManager {
    entities: Arc<EntityStore>,
    analytics: Arc<AnalyticsStore>,
}

impl ClientManager {
    pub fn new(entities: Arc<EntityStore>, analytics: Arc<AnalyticsStore>) -> Self {
        Self {
            entities,
            analytics,
        }
    }

    pub fn all(&self) -> Vec<Client> {
        self.entities.read(|doc| doc.clients.clone())
    }

    pub fn get(&self, id: &str) -> AdPulseResult<Client> {
        self.entities
            .read(|doc| doc.client(id).cloned())
            .ok_or_else(|| AdPulseError::not_found("client", id))
    }

    pub fn create(&self, req: CreateClientRequest) -> AdPulseResult<Client> {
        let now = Utc::now();
        let client = Client {
            id: ids::generate("cli"),
            name: req.name,
            company: req.company,
            email: req.email,
            phone: req.phone,
            website: req.website,
            address: req.address,
            contact: req.contact,
            status: req.status,
            tier: req.tier,
            billing: req.billing,
            notes: req.notes,
            tags: req.tags,
            created_at: now,
            updated_at: now,
        };
        let stored = client.clone();
        self.entities.mutate(move |doc| {
            doc.clients.push(client);
            Ok(())
        })?;
        info!(client_id = %stored.id, name = %stored.name, "Client created");
        Ok(stored)
    }

    pub fn update(&self, id: &str, req: UpdateClientRequest) -> AdPulseResult<Client> {
        self.entities.mutate(|doc| {
            let client = doc
                .client_mut(id)
                .ok_or_else(|| AdPulseError::not_found("client", id))?;
            if let Some(name) = req.name {
                client.name = name;
            }
            if let Some(company) = req.company {
                client.company = company;
            }
            if let Some(email) = req.email {
                client.email = email;
            }
            if let Some(phone) = req.phone {
                client.phone = phone;
            }
            if let Some(website) = req.website {
                client.website = website;
            }
            if let Some(address) = req.address {
                client.address = address;
            }
            if let Some(contact) = req.contact {
                client.contact = contact;
            }
            if let Some(status) = req.status {
                client.status = status;
            }
            if let Some(tier) = req.tier {
                client.tier = tier;
            }
            if let Some(billing) = req.billing {
                client.billing = billing;
            }
            if let Some(notes) = req.notes {
                client.notes = notes;
            }
            if let Some(tags) = req.tags {
                client.tags = tags;
            }
            client.updated_at = Utc::now();
            Ok(client.clone())
        })
    }

    /// Delete a client. Refused while the client still owns active banners.
    pub fn delete(&self, id: &str) -> AdPulseResult<()> {
        self.entities.mutate(|doc| {
            if doc.client(id).is_none() {
                return Err(AdPulseError::not_found("client", id));
            }
            let active = doc
                .banners
                .iter()
                .filter(|b| b.client_id.as_deref() == Some(id) && b.status == BannerStatus::Active)
                .count();
            if active > 0 {
                return Err(AdPulseError::ReferentialIntegrity(format!(
                    "cannot delete client with {active} active banner(s); \
                     deactivate or reassign them first"
                )));
            }
            doc.clients.retain(|c| c.id != id);
            Ok(())
        })?;
        info!(client_id = %id, "Client deleted");
        Ok(())
    }

    pub fn banners(&self, client_id: &str) -> Vec<Banner> {
        self.entities.read(|doc| {
            doc.banners
                .iter()
                .filter(|b| b.client_id.as_deref() == Some(client_id))
                .cloned()
                .collect()
        })
    }

    pub fn campaigns(&self, client_id: &str) -> Vec<Campaign> {
        self.entities.read(|doc| {
            doc.campaigns
                .iter()
                .filter(|c| c.client_id == client_id)
                .cloned()
                .collect()
        })
    }

    /// Performance summary across the client's banners, aggregated from the
    /// daily rollup.
    pub fn stats(&self, client_id: &str) -> AdPulseResult<ClientStats> {
        let (banners, campaigns) = self.entities.read(|doc| {
            if doc.client(client_id).is_none() {
                return Err(AdPulseError::not_found("client", client_id));
            }
            let banners: Vec<Banner> = doc
                .banners
                .iter()
                .filter(|b| b.client_id.as_deref() == Some(client_id))
                .cloned()
                .collect();
            let campaigns: Vec<Campaign> = doc
                .campaigns
                .iter()
                .filter(|c| c.client_id == client_id)
                .cloned()
                .collect();
            Ok((banners, campaigns))
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

        Ok(ClientStats {
            total_banners: banners.len(),
            active_banners: banners
                .iter()
                .filter(|b| b.status == BannerStatus::Active)
                .count(),
            paused_banners: banners
                .iter()
                .filter(|b| b.status == BannerStatus::Paused)
                .count(),
            total_campaigns: campaigns.len(),
            active_campaigns: campaigns
                .iter()
                .filter(|c| c.status == CampaignStatus::Active)
                .count(),
            total_impressions: impressions,
            total_clicks: clicks,
            ctr: ctr_string(impressions, clicks),
        })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adpulse_core::documents::Counts;

    fn managers() -> (
        ClientManager,
        Arc<EntityStore>,
        Arc<AnalyticsStore>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let entities = Arc::new(EntityStore::open(dir.path().join("banners.json")).unwrap());
        let analytics = Arc::new(AnalyticsStore::open(dir.path().join("analytics.json")).unwrap());
        (
            ClientManager::new(entities.clone(), analytics.clone()),
            entities,
            analytics,
            dir,
        )
    }

    fn create_req(name: &str) -> CreateClientRequest {
        CreateClientRequest {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn test_banner(id: &str, client_id: &str, status: BannerStatus) -> Banner {
        let now = Utc::now();
        Banner {
            id: id.to_string(),
            internal_id: String::new(),
            name: "Live".into(),
            client_id: Some(client_id.to_string()),
            campaign_id: None,
            status,
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
        }
    }

    #[test]
    fn test_create_and_get() {
        let (manager, _, _, _dir) = managers();
        let client = manager.create(create_req("Sterling Capital")).unwrap();
        assert!(client.id.starts_with("cli_"));
        let fetched = manager.get(&client.id).unwrap();
        assert_eq!(fetched.name, "Sterling Capital");
        assert_eq!(fetched.billing.payment_terms, "net30");
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let (manager, _, _, _dir) = managers();
        assert!(matches!(
            manager.get("cli_missing"),
            Err(AdPulseError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_merges_fields() {
        let (manager, _, _, _dir) = managers();
        let client = manager.create(create_req("Acme")).unwrap();
        let updated = manager
            .update(
                &client.id,
                UpdateClientRequest {
                    company: Some("Acme Holdings".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.company, "Acme Holdings");
        assert_eq!(updated.name, "Acme", "unset fields untouched");
    }

    #[test]
    fn test_delete_blocked_by_active_banner() {
        let (manager, entities, _, _dir) = managers();
        let client = manager.create(create_req("Acme")).unwrap();

        let banner = test_banner("ban_1", &client.id, BannerStatus::Active);
        entities
            .mutate(move |doc| {
                doc.banners.push(banner);
                Ok(())
            })
            .unwrap();

        let err = manager.delete(&client.id).unwrap_err();
        assert!(matches!(err, AdPulseError::ReferentialIntegrity(_)));
        assert!(manager.get(&client.id).is_ok(), "store unchanged");

        // Pausing the banner unblocks deletion.
        entities
            .mutate(|doc| {
                doc.banner_mut("ban_1").unwrap().status = BannerStatus::Paused;
                Ok(())
            })
            .unwrap();
        manager.delete(&client.id).unwrap();
        assert!(manager.get(&client.id).is_err());
    }

    #[test]
    fn test_stats_from_rollup() {
        let (manager, entities, analytics, _dir) = managers();
        let client = manager.create(create_req("Acme")).unwrap();

        let banner = test_banner("ban_1", &client.id, BannerStatus::Active);
        entities
            .mutate(move |doc| {
                doc.banners.push(banner);
                Ok(())
            })
            .unwrap();
        analytics
            .mutate(|doc| {
                doc.day_mut("2024-02-01").banners.insert(
                    "ban_1".into(),
                    Counts {
                        impressions: 400,
                        clicks: 2,
                    },
                );
                Ok(())
            })
            .unwrap();

        let stats = manager.stats(&client.id).unwrap();
        assert_eq!(stats.total_banners, 1);
        assert_eq!(stats.active_banners, 1);
        assert_eq!(stats.total_impressions, 400);
        assert_eq!(stats.total_clicks, 2);
        assert_eq!(stats.ctr, "0.50");
    }
}

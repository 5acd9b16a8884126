//! AdPulse — banner delivery, rotation, and analytics for a static news
//! site.
//!
//! Main entry point: loads configuration, opens the document stores, wires
//! the managers, and starts the API server.

use adpulse_analytics::AnalyticsManager;
use adpulse_api::{ApiServer, AppState};
use adpulse_core::config::AppConfig;
use adpulse_delivery::BannerManager;
use adpulse_management::{CampaignManager, ClientManager, PlacementManager};
use adpulse_store::{AnalyticsStore, EntityStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adpulse")]
#[command(about = "Banner delivery and analytics server")]
#[command(version)]
struct Cli {
    /// Directory holding the JSON document stores (overrides config)
    #[arg(long, env = "ADPULSE__STORAGE__DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(long, env = "ADPULSE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "ADPULSE__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Analytics retention horizon in days (overrides config)
    #[arg(long, env = "ADPULSE__RETENTION__DAYS_TO_KEEP")]
    retention_days: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpulse=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("AdPulse starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(days) = cli.retention_days {
        config.retention.days_to_keep = days;
    }

    info!(
        data_dir = %config.storage.data_dir.display(),
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration resolved"
    );

    let entities = Arc::new(EntityStore::open(config.storage.entity_path())?);
    let analytics = Arc::new(AnalyticsStore::open(config.storage.analytics_path())?);

    let state = AppState {
        banners: Arc::new(BannerManager::new(entities.clone(), analytics.clone())),
        placements: Arc::new(PlacementManager::new(entities.clone(), analytics.clone())),
        clients: Arc::new(ClientManager::new(entities.clone(), analytics.clone())),
        campaigns: Arc::new(CampaignManager::new(entities.clone(), analytics.clone())),
        analytics: Arc::new(AnalyticsManager::new(analytics.clone(), entities.clone())),
        retention_days: config.retention.days_to_keep,
        start_time: Instant::now(),
    };

    let server = ApiServer::new(config, state);
    if let Err(err) = server.start_metrics() {
        tracing::warn!(error = %err, "Metrics exporter unavailable");
    }
    server.start_http().await
}

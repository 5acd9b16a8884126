//! API server — HTTP router, middleware stack, and metrics exporter.

use crate::analytics_rest;
use crate::delivery_rest;
use crate::rest::{self, AppState};
use adpulse_core::config::AppConfig;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// The full route table. Exposed separately so tests can drive the
    /// router without binding a socket.
    pub fn router(state: AppState) -> Router {
        Router::new()
            // Banners
            .route("/api/banners", get(rest::list_banners).post(rest::create_banner))
            .route("/api/banners/stats", get(rest::banner_stats))
            .route(
                "/api/banners/:id",
                get(rest::get_banner)
                    .put(rest::update_banner)
                    .delete(rest::delete_banner),
            )
            .route("/api/banners/:id/toggle", post(rest::toggle_banner))
            .route("/api/banners/:id/duplicate", post(rest::duplicate_banner))
            .route("/api/banners/:id/revisions", get(rest::banner_revisions))
            // Clients
            .route("/api/clients", get(rest::list_clients).post(rest::create_client))
            .route(
                "/api/clients/:id",
                get(rest::get_client)
                    .put(rest::update_client)
                    .delete(rest::delete_client),
            )
            .route("/api/clients/:id/banners", get(rest::client_banners))
            .route("/api/clients/:id/campaigns", get(rest::client_campaigns))
            .route("/api/clients/:id/stats", get(rest::client_stats))
            // Campaigns
            .route(
                "/api/campaigns",
                get(rest::list_campaigns).post(rest::create_campaign),
            )
            .route(
                "/api/campaigns/:id",
                get(rest::get_campaign)
                    .put(rest::update_campaign)
                    .delete(rest::delete_campaign),
            )
            .route("/api/campaigns/:id/banners", get(rest::campaign_banners))
            .route("/api/campaigns/:id/stats", get(rest::campaign_stats))
            // Placements
            .route(
                "/api/placements",
                get(rest::list_placements).post(rest::create_placement),
            )
            .route("/api/placements/stats", get(rest::all_placement_stats))
            .route(
                "/api/placements/:id",
                get(rest::get_placement)
                    .put(rest::update_placement)
                    .delete(rest::delete_placement),
            )
            .route("/api/placements/:id/toggle", post(rest::toggle_placement))
            .route("/api/placements/:id/banners", get(rest::placement_banners))
            .route("/api/placements/:id/stats", get(rest::placement_stats))
            .route("/api/placements/:id/embed", get(rest::placement_embed))
            // Delivery & tracking
            .route("/api/deliver/:placement_id", get(delivery_rest::deliver))
            .route("/api/track/impression", post(delivery_rest::track_impression))
            .route("/api/track/click", post(delivery_rest::track_click))
            .route("/click/:banner_id", get(delivery_rest::click_redirect))
            // Audit & maintenance
            .route("/api/audit-log", get(delivery_rest::audit_log))
            .route("/api/maintenance/sweep", post(delivery_rest::maintenance_sweep))
            .route(
                "/api/maintenance/cleanup",
                post(delivery_rest::maintenance_cleanup),
            )
            // Analytics
            .route("/api/analytics/summary", get(analytics_rest::summary))
            .route("/api/analytics/banner/:id", get(analytics_rest::banner_report))
            .route(
                "/api/analytics/placement/:id",
                get(analytics_rest::placement_report),
            )
            .route("/api/analytics/client/:id", get(analytics_rest::client_report))
            .route(
                "/api/analytics/export/:type/:id",
                get(analytics_rest::export_csv),
            )
            // Operational
            .route("/health", get(rest::health_check))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP server; runs until shutdown.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = Self::router(self.state.clone());
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Install the Prometheus exporter on its own port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}

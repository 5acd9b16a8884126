//! Impression/click tracking, daily rollups, and reporting.

pub mod manager;
pub mod models;
mod reports;

pub use manager::AnalyticsManager;
pub use models::*;

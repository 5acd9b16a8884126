//! Banner inventory and the delivery selector.
//!
//! `BannerManager` owns creative CRUD (with audit logging and bounded
//! revision history), the schedule-driven status sweep, and delivery:
//! filtering eligible banners for a placement and rotating them into the
//! placement's slots.

pub mod banners;
pub mod eligibility;
pub mod models;
pub mod rotation;
pub mod utm;

pub use banners::BannerManager;
pub use models::{DeliveryBanner, DeliveryContext};
pub use utm::build_utm_url;

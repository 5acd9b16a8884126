//! Advertiser, campaign, and placement management.

pub mod campaigns;
pub mod clients;
pub mod models;
pub mod placements;

pub use campaigns::CampaignManager;
pub use clients::ClientManager;
pub use placements::PlacementManager;

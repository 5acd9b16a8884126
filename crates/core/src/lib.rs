pub mod config;
pub mod documents;
pub mod error;
pub mod ids;
pub mod types;

pub use config::AppConfig;
pub use error::{AdPulseError, AdPulseResult};

//! REST surface for the admin dashboard and the public site.

pub mod analytics_rest;
pub mod delivery_rest;
pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::ApiServer;

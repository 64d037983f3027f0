//! HTTP API handlers for mca-coincidence

pub mod coincidence;
pub mod health;

pub use coincidence::coincidence_routes;
pub use health::health_routes;

//! Route enricher
//!
//! An HTTP function that takes a batch of routes and attaches the current
//! weather at each origin and the live traffic to each destination.

pub mod api;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod routing;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::EnricherConfig;
pub use enrichment::{RouteEnricher, TrafficProvider, WeatherProvider};
pub use error::EnricherError;
pub use models::{Coordinates, EnrichmentRequest, Route, TrafficSummary, WeatherSummary};
pub use routing::DistanceMatrixClient;
pub use weather::WeatherApiClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EnricherError>;

//! Data models for the route enricher
//!
//! This module contains the request-scoped models organized by concern:
//! - Route: the open key/value route record and its coordinates
//! - Weather: current weather summary attached to a route
//! - Traffic: travel time and distance attached to a route

pub mod route;
pub mod traffic;
pub mod weather;

// Re-export all public types for convenient access
pub use route::{Coordinates, EnrichmentRequest, Route};
pub use traffic::TrafficSummary;
pub use weather::WeatherSummary;

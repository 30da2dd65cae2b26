//! Weather API client for the weatherapi.com current-conditions endpoint
//!
//! Failures here are NOT swallowed: a network error, a timeout or a body that
//! is not JSON aborts the whole batch. Only missing fields degrade to the
//! fixed defaults in [`WeatherSummary`]. Compare with [`crate::routing`],
//! which never fails.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::WeatherConfig;
use crate::enrichment::WeatherProvider;
use crate::models::{Coordinates, WeatherSummary};
use crate::{EnricherError, Result};

pub struct WeatherApiClient {
    client: Client,
    base_url: String,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("route-enricher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnricherError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get current weather at a point
    #[instrument(skip(self, origin, api_key), fields(q = %origin.to_query()))]
    pub async fn get_current_weather(
        &self,
        origin: &Coordinates,
        api_key: Option<&str>,
    ) -> Result<WeatherSummary> {
        let start_time = Instant::now();
        let url = format!("{}/current.json", self.base_url);
        let q = origin.to_query();

        let response = self
            .client
            .get(&url)
            .query(&[("key", api_key.unwrap_or_default()), ("q", q.as_str())])
            .send()
            .await
            .map_err(|e| EnricherError::weather(format!("request to {url} failed: {e}")))?;

        // Status is not checked; an error body without `current` yields the defaults.
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Weather API returned a non-success status");
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EnricherError::weather(format!("invalid response body: {e}")))?;

        let summary = WeatherSummary::from_response(&body)?;

        debug!(
            temp_c = summary.temp_c,
            status = %summary.status,
            "Retrieved current weather in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(summary)
    }
}

impl WeatherProvider for WeatherApiClient {
    async fn current_weather(
        &self,
        origin: &Coordinates,
        api_key: Option<&str>,
    ) -> Result<WeatherSummary> {
        self.get_current_weather(origin, api_key).await
    }
}

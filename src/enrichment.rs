//! Route enrichment
//!
//! Walks the routes of a request in order, looks up weather at the origin and
//! then traffic to the destination, and merges both into the route.
//!
//! The two lookups fail differently and must stay that way:
//! - a weather failure aborts the entire batch (no partial results);
//! - a traffic failure only zeroes that route's `traffic` field.
//!
//! [`TrafficProvider::traffic`] has no error type for this reason.

use std::future::Future;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument};

use crate::Result;
use crate::models::{Coordinates, EnrichmentRequest, Route, TrafficSummary, WeatherSummary};

/// Source of current weather at a point
pub trait WeatherProvider {
    fn current_weather(
        &self,
        origin: &Coordinates,
        api_key: Option<&str>,
    ) -> impl Future<Output = Result<WeatherSummary>> + Send;
}

/// Source of travel time and distance between two points. Infallible.
pub trait TrafficProvider {
    fn traffic(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        api_key: Option<&str>,
    ) -> impl Future<Output = TrafficSummary> + Send;
}

pub struct RouteEnricher<W, T> {
    weather: W,
    traffic: T,
    max_concurrent_routes: usize,
}

impl<W, T> RouteEnricher<W, T>
where
    W: WeatherProvider + Sync,
    T: TrafficProvider + Sync,
{
    /// Create an enricher that processes one route at a time
    pub fn new(weather: W, traffic: T) -> Self {
        Self {
            weather,
            traffic,
            max_concurrent_routes: 1,
        }
    }

    /// Allow up to `limit` routes in flight. Output order is unaffected.
    #[must_use]
    pub fn with_max_concurrent_routes(mut self, limit: usize) -> Self {
        self.max_concurrent_routes = limit.max(1);
        self
    }

    /// Enrich every route of the request, in input order.
    ///
    /// Returns the first weather error encountered and discards everything
    /// enriched so far.
    #[instrument(skip_all, fields(routes = request.routes.len()))]
    pub async fn enrich(&self, request: EnrichmentRequest) -> Result<Vec<Route>> {
        let EnrichmentRequest {
            weather_api_key,
            maps_api_key,
            routes,
        } = request;
        let weather_key = weather_api_key.as_deref();
        let maps_key = maps_api_key.as_deref();

        let results: Vec<(Route, bool)> = stream::iter(routes.into_iter().enumerate())
            .map(|(index, route)| self.enrich_route(index, route, weather_key, maps_key))
            .buffered(self.max_concurrent_routes)
            .try_collect()
            .await?;

        let degraded = results.iter().filter(|(_, available)| !available).count();
        info!(routes = results.len(), degraded, "Enriched all routes");

        Ok(results.into_iter().map(|(route, _)| route).collect())
    }

    async fn enrich_route(
        &self,
        index: usize,
        mut route: Route,
        weather_key: Option<&str>,
        maps_key: Option<&str>,
    ) -> Result<(Route, bool)> {
        let origin = route.origin();
        let destination = route.destination();

        let weather = self.weather.current_weather(&origin, weather_key).await?;
        let traffic = self.traffic.traffic(&origin, &destination, maps_key).await;
        debug!(index, available = traffic.is_available(), "Route looked up");

        route.attach(&weather, &traffic)?;
        Ok((route, traffic.is_available()))
    }
}

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    EnricherError,
    config::MapsConfig,
    enrichment::TrafficProvider,
    models::{Coordinates, TrafficSummary},
};

/// Google Distance Matrix client.
///
/// Unlike the weather lookup this never fails: any error degrades the
/// route's traffic to [`TrafficSummary::Unavailable`] and the batch goes on.
pub struct DistanceMatrixClient {
    client: Client,
    base_url: String,
}

impl DistanceMatrixClient {
    pub fn new(config: &MapsConfig) -> crate::Result<Self> {
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

    #[instrument(skip_all, fields(origin = %origin.to_query(), destination = %destination.to_query()))]
    pub async fn get_traffic(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        api_key: Option<&str>,
    ) -> TrafficSummary {
        match self.get_traffic_call(origin, destination, api_key).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Traffic lookup failed, reporting zeros: {e:#}");
                TrafficSummary::Unavailable
            }
        }
    }

    async fn get_traffic_call(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        api_key: Option<&str>,
    ) -> Result<TrafficSummary> {
        tracing::debug!("Calling the API");
        let url = format!("{}/distancematrix/json", self.base_url);
        let origins = origin.to_query();
        let destinations = destination.to_query();

        let response = self
            .client
            .get(url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("departure_time", "now"),
                ("key", api_key.unwrap_or_default()),
            ])
            .send()
            .await
            .context("Distance matrix request failed")?;
        let response: DistanceMatrixResponse = response
            .json()
            .await
            .context("Distance matrix response is not readable")?;

        response.first_summary()
    }
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: Option<String>,
    #[serde(default)]
    rows: Vec<RowResponse>,
}

#[derive(Debug, Deserialize)]
struct RowResponse {
    #[serde(default)]
    elements: Vec<ElementResponse>,
}

#[derive(Debug, Deserialize)]
struct ElementResponse {
    status: Option<String>,
    duration_in_traffic: Option<MeasureResponse>,
    distance: Option<MeasureResponse>,
}

#[derive(Debug, Deserialize)]
struct MeasureResponse {
    value: f64,
}

impl DistanceMatrixResponse {
    /// Summary of `rows[0].elements[0]`, the only pair requested
    fn first_summary(&self) -> Result<TrafficSummary> {
        let element = self
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or_else(|| {
                anyhow!(
                    "No elements in response (status {})",
                    self.status.as_deref().unwrap_or("missing")
                )
            })?;

        match (&element.duration_in_traffic, &element.distance) {
            (Some(duration), Some(distance)) => {
                Ok(TrafficSummary::from_raw(duration.value, distance.value))
            }
            _ => Err(anyhow!(
                "Element has no traffic duration or distance (status {})",
                element.status.as_deref().unwrap_or("missing")
            )),
        }
    }
}

impl TrafficProvider for DistanceMatrixClient {
    async fn traffic(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        api_key: Option<&str>,
    ) -> TrafficSummary {
        self.get_traffic(origin, destination, api_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: String) -> DistanceMatrixClient {
        DistanceMatrixClient::new(&MapsConfig {
            base_url,
            timeout_seconds: 2,
        })
        .unwrap()
    }

    fn origin() -> Coordinates {
        Coordinates::new(Some(json!(40.7128)), Some(json!(-74.006)))
    }

    fn destination() -> Coordinates {
        Coordinates::new(Some(json!(40.7306)), Some(json!(-73.9352)))
    }

    #[tokio::test]
    async fn test_reads_traffic_duration_and_distance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/distancematrix/json"))
            .and(query_param("origins", "40.7128,-74.006"))
            .and(query_param("destinations", "40.7306,-73.9352"))
            .and(query_param("departure_time", "now"))
            .and(query_param("key", "maps-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "rows": [{ "elements": [{
                    "status": "OK",
                    "duration_in_traffic": { "value": 125 },
                    "distance": { "value": 1050 }
                }]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(server.uri())
            .get_traffic(&origin(), &destination(), Some("maps-key"))
            .await;

        assert_eq!(
            summary,
            TrafficSummary::Measured {
                duration_min: 2.08,
                distance_km: 1.05
            }
        );
    }

    #[tokio::test]
    async fn test_no_route_degrades_to_zeros() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "rows": [{ "elements": [{ "status": "ZERO_RESULTS" }] }]
            })))
            .mount(&server)
            .await;

        let summary = client_for(server.uri())
            .get_traffic(&origin(), &destination(), Some("maps-key"))
            .await;

        assert_eq!(summary, TrafficSummary::Unavailable);
    }

    #[tokio::test]
    async fn test_non_json_body_degrades_to_zeros() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let summary = client_for(server.uri())
            .get_traffic(&origin(), &destination(), None)
            .await;

        assert_eq!(summary, TrafficSummary::Unavailable);
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_zeros() {
        // Nothing listens on the discard port.
        let summary = client_for("http://127.0.0.1:9".to_string())
            .get_traffic(&origin(), &destination(), Some("maps-key"))
            .await;

        assert_eq!(summary, TrafficSummary::Unavailable);
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_zeros() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "rows": [{ "elements": [{
                            "duration_in_traffic": { "value": 125 },
                            "distance": { "value": 1050 }
                        }]}]
                    }))
                    .set_delay(Duration::from_secs(4)),
            )
            .mount(&server)
            .await;

        let client = DistanceMatrixClient::new(&MapsConfig {
            base_url: server.uri(),
            timeout_seconds: 1,
        })
        .unwrap();
        let summary = client
            .get_traffic(&origin(), &destination(), Some("maps-key"))
            .await;

        assert_eq!(summary, TrafficSummary::Unavailable);
    }

    #[test]
    fn test_first_summary_reads_first_cell() {
        let response: DistanceMatrixResponse = serde_json::from_value(json!({
            "status": "OK",
            "rows": [
                { "elements": [
                    {
                        "status": "OK",
                        "duration": { "value": 100, "text": "2 mins" },
                        "duration_in_traffic": { "value": 125, "text": "2 mins" },
                        "distance": { "value": 1050, "text": "1.1 km" }
                    },
                    { "status": "OK", "duration_in_traffic": { "value": 1 }, "distance": { "value": 1 } }
                ]},
                { "elements": [] }
            ]
        }))
        .unwrap();

        assert_eq!(
            response.first_summary().unwrap(),
            TrafficSummary::Measured {
                duration_min: 2.08,
                distance_km: 1.05
            }
        );
    }

    #[rstest]
    #[case::no_rows(json!({ "status": "REQUEST_DENIED" }))]
    #[case::empty_rows(json!({ "rows": [] }))]
    #[case::empty_elements(json!({ "rows": [{ "elements": [] }] }))]
    #[case::zero_results(json!({ "rows": [{ "elements": [{ "status": "ZERO_RESULTS" }] }] }))]
    #[case::no_traffic_duration(json!({ "rows": [{ "elements": [{ "distance": { "value": 10 } }] }] }))]
    fn test_first_summary_rejects_missing_cells(#[case] body: Value) {
        let response: DistanceMatrixResponse = serde_json::from_value(body).unwrap();
        assert!(response.first_summary().is_err());
    }

    #[rstest]
    #[case::string_value(json!({ "rows": [{ "elements": [{
        "duration_in_traffic": { "value": "125" },
        "distance": { "value": 1050 }
    }] }] }))]
    #[case::not_an_object(json!("nope"))]
    fn test_unexpected_shapes_do_not_parse(#[case] body: Value) {
        assert!(serde_json::from_value::<DistanceMatrixResponse>(body).is_err());
    }
}

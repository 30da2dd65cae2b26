//! Route records and the enrichment request envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{TrafficSummary, WeatherSummary};
use crate::{EnricherError, Result};

pub const WEATHER_API_KEY_FIELD: &str = "WEATHER_API_KEY";
pub const MAPS_API_KEY_FIELD: &str = "MAPS_API_KEY";
pub const ROUTES_FIELD: &str = "routes";

/// A point as given by the caller. Values are passed upstream untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: Option<Value>, longitude: Option<Value>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as the `lat,lon` pair both upstream APIs take
    #[must_use]
    pub fn to_query(&self) -> String {
        format!(
            "{},{}",
            query_component(self.latitude.as_ref()),
            query_component(self.longitude.as_ref())
        )
    }
}

fn query_component(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// A single route: an ordered key/value bag carrying at least the
/// `origin_*`/`dest_*` coordinates. Unknown keys pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Map<String, Value>);

impl Route {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn origin(&self) -> Coordinates {
        Coordinates::new(
            self.0.get("origin_lat").cloned(),
            self.0.get("origin_lon").cloned(),
        )
    }

    #[must_use]
    pub fn destination(&self) -> Coordinates {
        Coordinates::new(
            self.0.get("dest_lat").cloned(),
            self.0.get("dest_lon").cloned(),
        )
    }

    /// Insert `weather` and `traffic`, replacing existing keys in place
    pub fn attach(&mut self, weather: &WeatherSummary, traffic: &TrafficSummary) -> Result<()> {
        let weather = serde_json::to_value(weather)
            .map_err(|e| EnricherError::general(format!("Failed to encode weather: {e}")))?;
        let traffic = serde_json::to_value(traffic)
            .map_err(|e| EnricherError::general(format!("Failed to encode traffic: {e}")))?;
        self.0.insert("weather".to_string(), weather);
        self.0.insert("traffic".to_string(), traffic);
        Ok(())
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Body of an enrichment call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentRequest {
    pub weather_api_key: Option<String>,
    pub maps_api_key: Option<String>,
    pub routes: Vec<Route>,
}

impl EnrichmentRequest {
    /// Parse a raw request body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Read the envelope out of an already parsed body.
    ///
    /// Keys may be absent; `routes` defaults to empty when absent but must be
    /// an array of objects when present.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut body) = value else {
            return Err(EnricherError::invalid_request(
                "request body must be a JSON object",
            ));
        };

        let weather_api_key = api_key(body.get(WEATHER_API_KEY_FIELD));
        let maps_api_key = api_key(body.get(MAPS_API_KEY_FIELD));

        let routes = match body.remove(ROUTES_FIELD) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(fields) => Ok(Route(fields)),
                    other => Err(EnricherError::invalid_request(format!(
                        "route {index} must be a JSON object, got {}",
                        json_type_name(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(EnricherError::invalid_request(format!(
                    "`routes` must be an array, got {}",
                    json_type_name(&other)
                )));
            }
        };

        Ok(Self {
            weather_api_key,
            maps_api_key,
            routes,
        })
    }
}

fn api_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(key) => Some(key.clone()),
        other => Some(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route(value: Value) -> Route {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_coordinates_query_formatting() {
        let point = Coordinates::new(Some(json!(40.7128)), Some(json!(-74.006)));
        assert_eq!(point.to_query(), "40.7128,-74.006");

        let integers = Coordinates::new(Some(json!(51)), Some(json!(0)));
        assert_eq!(integers.to_query(), "51,0");

        let strings = Coordinates::new(Some(json!("48.85")), Some(json!("2.35")));
        assert_eq!(strings.to_query(), "48.85,2.35");

        assert_eq!(Coordinates::default().to_query(), ",");
    }

    #[test]
    fn test_route_reads_coordinates() {
        let route = route(json!({
            "id": "r-1",
            "origin_lat": 1.5,
            "origin_lon": 2.5,
            "dest_lat": 3.5,
            "dest_lon": 4.5
        }));
        assert_eq!(
            route.origin(),
            Coordinates::new(Some(json!(1.5)), Some(json!(2.5)))
        );
        assert_eq!(
            route.destination(),
            Coordinates::new(Some(json!(3.5)), Some(json!(4.5)))
        );
    }

    #[test]
    fn test_missing_coordinates_are_absent() {
        let route = route(json!({ "origin_lat": 1.0 }));
        assert_eq!(route.origin(), Coordinates::new(Some(json!(1.0)), None));
        assert_eq!(route.destination(), Coordinates::default());
    }

    #[test]
    fn test_attach_keeps_fields_and_order() {
        let mut route = route(json!({
            "name": "commute",
            "weather": "stale",
            "origin_lat": 1.0,
            "meta": { "tags": ["a", "b"] }
        }));
        let weather = WeatherSummary {
            temp_c: 20.0,
            status: "Sunny".to_string(),
        };
        route
            .attach(&weather, &TrafficSummary::Unavailable)
            .unwrap();

        let keys: Vec<&str> = route.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "weather", "origin_lat", "meta", "traffic"]);
        assert_eq!(
            serde_json::to_value(&route).unwrap(),
            json!({
                "name": "commute",
                "weather": { "temp_c": 20.0, "status": "Sunny" },
                "origin_lat": 1.0,
                "meta": { "tags": ["a", "b"] },
                "traffic": { "duration_min": 0, "distance_km": 0 }
            })
        );
    }

    #[test]
    fn test_request_parsing() {
        let request = EnrichmentRequest::from_slice(
            br#"{"WEATHER_API_KEY":"w","MAPS_API_KEY":"m","routes":[{"origin_lat":1},{"x":true}]}"#,
        )
        .unwrap();
        assert_eq!(request.weather_api_key.as_deref(), Some("w"));
        assert_eq!(request.maps_api_key.as_deref(), Some("m"));
        assert_eq!(request.routes.len(), 2);
        assert_eq!(request.routes[1].fields()["x"], json!(true));
    }

    #[test]
    fn test_request_defaults() {
        let request = EnrichmentRequest::from_slice(b"{}").unwrap();
        assert_eq!(request, EnrichmentRequest::default());

        let numeric_key = EnrichmentRequest::from_value(json!({ "MAPS_API_KEY": 1234 })).unwrap();
        assert_eq!(numeric_key.maps_api_key.as_deref(), Some("1234"));
    }

    #[test]
    fn test_request_rejects_bad_shapes() {
        assert!(EnrichmentRequest::from_slice(b"not json").is_err());
        assert!(EnrichmentRequest::from_slice(b"").is_err());
        assert!(EnrichmentRequest::from_value(json!([])).is_err());
        assert!(EnrichmentRequest::from_value(json!({ "routes": null })).is_err());
        assert!(EnrichmentRequest::from_value(json!({ "routes": { "a": 1 } })).is_err());

        let err = EnrichmentRequest::from_value(json!({ "routes": [{}, 7] })).unwrap_err();
        assert!(err.to_string().contains("route 1 must be a JSON object"));
    }
}

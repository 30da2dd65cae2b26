//! Current weather summary attached to each route

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EnricherError, Result};

/// Temperature reported when the upstream body has no `current.temp_c`
pub const DEFAULT_TEMP_C: f64 = 28.0;
/// Condition reported when the upstream body has no `current.condition.text`
pub const DEFAULT_STATUS: &str = "Partly cloudy";

/// Weather at a route's origin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSummary {
    /// Temperature in Celsius
    pub temp_c: f64,
    /// Human-readable description of weather conditions
    pub status: String,
}

impl Default for WeatherSummary {
    fn default() -> Self {
        Self {
            temp_c: DEFAULT_TEMP_C,
            status: DEFAULT_STATUS.to_string(),
        }
    }
}

impl WeatherSummary {
    /// Extract the summary from a current-weather response body.
    ///
    /// Absent fields fall back to the defaults. A body whose shape cannot be
    /// walked at all (not an object, or `current`/`condition` present with a
    /// non-object value) is an error, which aborts the batch.
    pub fn from_response(body: &Value) -> Result<Self> {
        let body = body
            .as_object()
            .ok_or_else(|| EnricherError::weather("response body is not a JSON object"))?;

        let Some(current) = body.get("current") else {
            return Ok(Self::default());
        };
        let current = current
            .as_object()
            .ok_or_else(|| EnricherError::weather("`current` is not a JSON object"))?;

        let temp_c = current
            .get("temp_c")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_TEMP_C);

        let status = match current.get("condition") {
            None => DEFAULT_STATUS.to_string(),
            Some(condition) => condition
                .as_object()
                .ok_or_else(|| EnricherError::weather("`current.condition` is not a JSON object"))?
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_STATUS)
                .to_string(),
        };

        Ok(Self { temp_c, status })
    }
}

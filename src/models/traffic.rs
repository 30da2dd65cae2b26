//! Travel time and distance attached to each route

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Traffic between a route's origin and destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrafficSummary {
    /// Values read from the distance matrix, rounded to two decimals
    Measured { duration_min: f64, distance_km: f64 },
    /// Lookup failed for any reason; serialized as integer zeros
    Unavailable,
}

impl TrafficSummary {
    /// Build a summary from raw upstream units (seconds and meters)
    #[must_use]
    pub fn from_raw(duration_seconds: f64, distance_meters: f64) -> Self {
        Self::Measured {
            duration_min: round2(duration_seconds / 60.0),
            distance_km: round2(distance_meters / 1000.0),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Measured { .. })
    }
}

impl Serialize for TrafficSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TrafficSummary", 2)?;
        match self {
            Self::Measured {
                duration_min,
                distance_km,
            } => {
                state.serialize_field("duration_min", duration_min)?;
                state.serialize_field("distance_km", distance_km)?;
            }
            Self::Unavailable => {
                state.serialize_field("duration_min", &0u8)?;
                state.serialize_field("distance_km", &0u8)?;
            }
        }
        state.end()
    }
}

/// Two decimals, ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

//! Route models produced by the routing client and the orchestrator

use serde::{Deserialize, Serialize};

use super::location::Coordinate;

/// Driving route between two coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Total distance in kilometres, rounded to two decimals
    pub distance_km: f64,
    /// Total duration in minutes, rounded to one decimal
    pub duration_minutes: f64,
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Simplified route line when the provider returned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Coordinate>>,
}

/// Successful outcome of one end-to-end request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrip {
    /// Origin as the user wrote it
    pub origin_label: String,
    /// Destination as the user wrote it
    pub destination_label: String,
    /// Provider display label for the origin
    pub origin_match: String,
    /// Provider display label for the destination
    pub destination_match: String,
    pub route: RouteSummary,
}

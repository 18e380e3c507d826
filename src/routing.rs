use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::{ProviderFailure, RouteError};
use crate::http::{self, CallError};
use crate::models::{Coordinate, RouteSummary};
use crate::retry::RetryPolicy;

/// Anything that can compute a driving route between two points
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError>;
}

/// LocationIQ driving directions client
pub struct LocationIqRouter {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl LocationIqRouter {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(config.attempt_timeout())?,
            api_key: config.api_key().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry_policy(),
        })
    }

    // coordinates go lon,lat in the path
    fn directions_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/directions/driving/{},{};{},{}?key={}&overview=simplified&geometries=geojson&steps=false",
            self.base_url,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl RouteProvider for LocationIqRouter {
    #[instrument(skip_all, fields(%origin, %destination))]
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError> {
        let url = self.directions_url(origin, destination);
        debug!("LocationIQ directions request: {}", http::redact_key(&url));

        let response: ApiResponse = self
            .retry
            .run("route", CallError::is_transient, |_| {
                http::get_json(&self.client, &url)
            })
            .await
            .map_err(|e| {
                warn!("Routing failed: {}", e);
                RouteError::new(e.failure(), e.to_string())
            })?;

        let summary = response.into_summary(origin, destination)?;
        info!(
            "Calculated route: {:.2}km, {:.1}min",
            summary.distance_km, summary.duration_minutes
        );
        Ok(summary)
    }
}

/// Round half away from zero to `decimals` places
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Metres to kilometres, two decimals
#[must_use]
pub fn metres_to_km(metres: f64) -> f64 {
    round_to(metres / 1000.0, 2)
}

/// Seconds to minutes, one decimal
#[must_use]
pub fn seconds_to_minutes(seconds: f64) -> f64 {
    round_to(seconds / 60.0, 1)
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON positions, `[lon, lat]`
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct PathResponse {
    /// metres
    distance: f64,
    /// seconds
    duration: f64,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: Option<String>,
    #[serde(default)]
    routes: Vec<PathResponse>,
}

impl ApiResponse {
    fn into_summary(
        self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError> {
        match self.code.as_deref() {
            None | Some("Ok") => {}
            Some(code @ ("NoRoute" | "NoSegment")) => {
                return Err(RouteError::new(ProviderFailure::NotFound, code));
            }
            Some(code) => {
                return Err(RouteError::new(
                    ProviderFailure::BadResponse,
                    format!("unexpected response code {code}"),
                ));
            }
        }

        let path = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::new(ProviderFailure::NotFound, "No paths in response"))?;

        let valid = |value: f64| value.is_finite() && value >= 0.0;
        if !valid(path.distance) || !valid(path.duration) {
            return Err(RouteError::new(
                ProviderFailure::BadResponse,
                format!(
                    "invalid distance/duration {}/{}",
                    path.distance, path.duration
                ),
            ));
        }

        let geometry = path.geometry.map(|geometry| {
            geometry
                .coordinates
                .into_iter()
                .filter_map(|[lon, lat]| Coordinate::new(lat, lon))
                .collect()
        });

        Ok(RouteSummary {
            distance_km: metres_to_km(path.distance),
            duration_minutes: seconds_to_minutes(path.duration),
            origin,
            destination,
            geometry,
        })
    }
}

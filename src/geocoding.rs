//! Geocoding client
//!
//! Resolves a place name to coordinates through the LocationIQ forward
//! search API. The first candidate wins; LocationIQ orders candidates by
//! relevance.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::{GeocodeError, ProviderFailure};
use crate::http::{self, CallError};
use crate::models::{Coordinate, GeocodeResult, LocationQuery};
use crate::retry::RetryPolicy;

/// Anything that can turn a place name into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, query: &LocationQuery) -> Result<GeocodeResult, GeocodeError>;
}

/// LocationIQ forward geocoding client
pub struct LocationIqGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl LocationIqGeocoder {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(config.attempt_timeout())?,
            api_key: config.api_key().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry_policy(),
        })
    }

    fn search_url(&self, query: &LocationQuery) -> String {
        format!(
            "{}/search?key={}&q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query.as_str())
        )
    }
}

#[async_trait]
impl Geocoder for LocationIqGeocoder {
    #[instrument(skip_all, fields(query = %query))]
    async fn resolve(&self, query: &LocationQuery) -> Result<GeocodeResult, GeocodeError> {
        let url = self.search_url(query);
        debug!("LocationIQ search request: {}", http::redact_key(&url));

        let candidates: Vec<locationiq::SearchCandidate> = self
            .retry
            .run("geocode", CallError::is_transient, |_| {
                http::get_json(&self.client, &url)
            })
            .await
            .map_err(|e| {
                warn!("Geocoding '{}' failed: {}", query, e);
                GeocodeError::new(e.failure(), e.to_string())
            })?;

        let Some(candidate) = candidates.into_iter().next() else {
            warn!("No geocoding results for '{}'", query);
            return Err(GeocodeError::new(
                ProviderFailure::NotFound,
                "provider returned no candidates",
            ));
        };

        let result = candidate.into_result(query)?;
        info!(
            "Geocoded '{}' to {} ({})",
            query, result.coordinate, result.matched_label
        );
        Ok(result)
    }
}

/// LocationIQ search response structures
mod locationiq {
    use serde::Deserialize;

    use super::{Coordinate, GeocodeError, GeocodeResult, LocationQuery, ProviderFailure};

    /// LocationIQ sends coordinates as strings; accept plain numbers too
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum Degrees {
        Number(f64),
        Text(String),
    }

    impl Degrees {
        fn value(&self) -> Option<f64> {
            match self {
                Degrees::Number(value) => Some(*value),
                Degrees::Text(text) => text.trim().parse().ok(),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchCandidate {
        pub lat: Degrees,
        pub lon: Degrees,
        pub display_name: Option<String>,
    }

    impl SearchCandidate {
        pub fn into_result(self, query: &LocationQuery) -> Result<GeocodeResult, GeocodeError> {
            let coordinate = self
                .lat
                .value()
                .zip(self.lon.value())
                .and_then(|(lat, lon)| Coordinate::new(lat, lon))
                .ok_or_else(|| {
                    GeocodeError::new(
                        ProviderFailure::BadResponse,
                        format!("unusable coordinates {:?}/{:?}", self.lat, self.lon),
                    )
                })?;

            Ok(GeocodeResult {
                query: query.clone(),
                coordinate,
                matched_label: self
                    .display_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| query.to_string()),
            })
        }
    }
}

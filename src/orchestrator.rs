//! Route resolution pipeline
//!
//! Parse the message, geocode origin and destination concurrently and wait
//! for both, route between the two coordinates and assemble a
//! `ResolvedTrip`. When both lookups fail the origin failure is reported.
//! The whole sequence runs under one deadline; when it fires the in-flight
//! futures are dropped, so nothing completes after the caller has its
//! answer.
//!
//! Retries belong to the provider clients. This layer only decides pass or
//! fail per stage.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use anyhow::Result;
use futures::TryFutureExt;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, instrument, warn};

use crate::config::MapRouteConfig;
use crate::error::{ResolutionError, Stage};
use crate::formatter::ResponseFormatter;
use crate::geocoding::{Geocoder, LocationIqGeocoder};
use crate::models::{AgentReply, ResolvedTrip};
use crate::parser::MessageParser;
use crate::routing::{LocationIqRouter, RouteProvider};

/// Stage currently in flight, readable after the pipeline future is dropped
struct StageTracker(AtomicU8);

impl StageTracker {
    fn new() -> Self {
        Self(AtomicU8::new(Stage::Parse as u8))
    }

    fn set(&self, stage: Stage) {
        self.0.store(stage as u8, Ordering::Relaxed);
    }

    /// Move from `from` to `to` unless another step already moved on
    fn advance(&self, from: Stage, to: Stage) {
        let _ = self
            .0
            .compare_exchange(from as u8, to as u8, Ordering::Relaxed, Ordering::Relaxed);
    }

    fn get(&self) -> Stage {
        Stage::from_u8(self.0.load(Ordering::Relaxed))
    }
}

/// Resolves "directions from X to Y" messages into trips
#[derive(Clone)]
pub struct RouteResolver {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn RouteProvider>,
    request_timeout: Duration,
}

impl RouteResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn RouteProvider>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            geocoder,
            router,
            request_timeout,
        }
    }

    /// Build a resolver backed by the LocationIQ clients
    pub fn from_config(config: &MapRouteConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(LocationIqGeocoder::new(&config.geocoding)?),
            Arc::new(LocationIqRouter::new(&config.routing)?),
            config.agent.request_timeout(),
        ))
    }

    /// Resolve a message into a trip, or the stage and reason it failed at
    #[instrument(skip_all)]
    pub async fn resolve(&self, message: &str) -> Result<ResolvedTrip, ResolutionError> {
        let started = Instant::now();
        let stage = StageTracker::new();

        let outcome = match timeout(self.request_timeout, self.run(message, &stage)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let stage = stage.get();
                warn!(
                    "Request timed out after {:.1}s during {}",
                    self.request_timeout.as_secs_f64(),
                    stage
                );
                Err(ResolutionError::timeout(stage))
            }
        };

        match &outcome {
            Ok(trip) => info!(
                "Resolved {} -> {} in {:.3}s",
                trip.origin_label,
                trip.destination_label,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => info!(
                stage = e.stage.as_str(),
                reason = e.reason.as_str(),
                "Resolution failed in {:.3}s",
                started.elapsed().as_secs_f64()
            ),
        }
        outcome
    }

    /// Resolve and format in one go; always yields a reply
    pub async fn reply(&self, message: &str) -> AgentReply {
        match self.resolve(message).await {
            Ok(trip) => ResponseFormatter::format(&trip),
            Err(e) => ResponseFormatter::format_error(&e),
        }
    }

    async fn run(
        &self,
        message: &str,
        stage: &StageTracker,
    ) -> Result<ResolvedTrip, ResolutionError> {
        let request = MessageParser::parse(message)?;
        debug!(
            "Resolving {} -> {}",
            request.origin, request.destination
        );

        stage.set(Stage::GeocodeOrigin);
        let origin = self.geocoder.resolve(&request.origin).map_ok(|result| {
            stage.advance(Stage::GeocodeOrigin, Stage::GeocodeDestination);
            result
        });
        let destination = self.geocoder.resolve(&request.destination);

        // Both lookups finish before either outcome is judged; origin is checked first
        let (origin, destination) = tokio::join!(origin, destination);
        let origin = origin.map_err(|e| ResolutionError::geocode(Stage::GeocodeOrigin, &e))?;
        let destination =
            destination.map_err(|e| ResolutionError::geocode(Stage::GeocodeDestination, &e))?;

        stage.set(Stage::Route);
        let route = self
            .router
            .route(origin.coordinate, destination.coordinate)
            .await?;

        Ok(ResolvedTrip {
            origin_label: request.origin.to_string(),
            destination_label: request.destination.to_string(),
            origin_match: origin.matched_label,
            destination_match: destination.matched_label,
            route,
        })
    }
}

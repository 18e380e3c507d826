//! Error types for the `MapRoute` agent
//!
//! Two families live here: `MapRouteError` for startup failures (missing or
//! out-of-range configuration) and the request pipeline taxonomy
//! (`ParseError`, `GeocodeError`, `RouteError`, `ResolutionError`).

use std::fmt;

use thiserror::Error;

/// Process-level error type for the `MapRoute` application
#[derive(Error, Debug)]
pub enum MapRouteError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A setting is present but outside its allowed range
    #[error("Invalid setting: {message}")]
    Validation { message: String },
}

impl MapRouteError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MapRouteError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            MapRouteError::Validation { message } => format!("Invalid setting: {message}"),
        }
    }
}

/// Why a message could not be turned into an origin/destination pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseReason {
    /// No directional keyword pairing at all
    NoPattern,
    MissingOrigin,
    MissingDestination,
    InvalidOrigin,
    InvalidDestination,
}

impl ParseReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseReason::NoPattern => "no_pattern",
            ParseReason::MissingOrigin => "missing_origin",
            ParseReason::MissingDestination => "missing_destination",
            ParseReason::InvalidOrigin => "invalid_origin",
            ParseReason::InvalidDestination => "invalid_destination",
        }
    }
}

impl fmt::Display for ParseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse route request: {reason}")]
pub struct ParseError {
    pub reason: ParseReason,
}

impl ParseError {
    #[must_use]
    pub fn new(reason: ParseReason) -> Self {
        Self { reason }
    }
}

/// Final failure class of a provider call, after the client's retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Provider answered but had nothing for the request
    NotFound,
    /// Transient failures persisted past the retry policy, or a hard
    /// rejection (auth, bad request) that makes the provider unusable
    ProviderUnavailable,
    /// Response could not be decoded or violated basic invariants
    BadResponse,
}

impl ProviderFailure {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFailure::NotFound => "not_found",
            ProviderFailure::ProviderUnavailable => "provider_unavailable",
            ProviderFailure::BadResponse => "bad_response",
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geocoding client failure. `detail` is for logs only.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("geocoding failed ({reason}): {detail}")]
pub struct GeocodeError {
    pub reason: ProviderFailure,
    pub detail: String,
}

impl GeocodeError {
    pub fn new<S: Into<String>>(reason: ProviderFailure, detail: S) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Routing client failure. `detail` is for logs only.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("routing failed ({reason}): {detail}")]
pub struct RouteError {
    pub reason: ProviderFailure,
    pub detail: String,
}

impl RouteError {
    pub fn new<S: Into<String>>(reason: ProviderFailure, detail: S) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Pipeline step that produced a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    Parse = 0,
    GeocodeOrigin = 1,
    GeocodeDestination = 2,
    Route = 3,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::GeocodeOrigin => "geocode_origin",
            Stage::GeocodeDestination => "geocode_destination",
            Stage::Route => "route",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Stage::Parse,
            1 => Stage::GeocodeOrigin,
            2 => Stage::GeocodeDestination,
            _ => Stage::Route,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Parse(ParseReason),
    Provider(ProviderFailure),
    /// The overall request deadline fired
    Timeout,
}

impl FailureReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Parse(reason) => reason.as_str(),
            FailureReason::Provider(failure) => failure.as_str(),
            FailureReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a failed resolution.
///
/// On timeout `stage` records the step that was in flight when the
/// deadline fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("resolution failed at {stage}: {reason}")]
pub struct ResolutionError {
    pub stage: Stage,
    pub reason: FailureReason,
}

impl ResolutionError {
    #[must_use]
    pub fn timeout(stage: Stage) -> Self {
        Self {
            stage,
            reason: FailureReason::Timeout,
        }
    }

    #[must_use]
    pub fn geocode(stage: Stage, error: &GeocodeError) -> Self {
        Self {
            stage,
            reason: FailureReason::Provider(error.reason),
        }
    }

    /// Key used to pick the user-facing message
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self.reason {
            FailureReason::Timeout => "timeout",
            _ => self.stage.as_str(),
        }
    }
}

impl From<ParseError> for ResolutionError {
    fn from(error: ParseError) -> Self {
        Self {
            stage: Stage::Parse,
            reason: FailureReason::Parse(error.reason),
        }
    }
}

impl From<RouteError> for ResolutionError {
    fn from(error: RouteError) -> Self {
        Self {
            stage: Stage::Route,
            reason: FailureReason::Provider(error.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = MapRouteError::config("missing API key");
        assert!(matches!(config_err, MapRouteError::Config { .. }));

        let validation_err = MapRouteError::validation("max attempts out of range");
        assert!(matches!(validation_err, MapRouteError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = MapRouteError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let validation_err = MapRouteError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_resolution_error_tags() {
        let parse: ResolutionError = ParseError::new(ParseReason::MissingDestination).into();
        assert_eq!(parse.tag(), "parse");
        assert_eq!(parse.reason.as_str(), "missing_destination");

        let geocode = ResolutionError::geocode(
            Stage::GeocodeDestination,
            &GeocodeError::new(ProviderFailure::NotFound, "empty result"),
        );
        assert_eq!(geocode.tag(), "geocode_destination");
        assert_eq!(geocode.reason.as_str(), "not_found");

        let route: ResolutionError =
            RouteError::new(ProviderFailure::ProviderUnavailable, "503").into();
        assert_eq!(route.tag(), "route");

        let timeout = ResolutionError::timeout(Stage::Route);
        assert_eq!(timeout.tag(), "timeout");
        assert_eq!(timeout.stage, Stage::Route);
    }

    #[test]
    fn test_stage_round_trips_through_u8() {
        for stage in [
            Stage::Parse,
            Stage::GeocodeOrigin,
            Stage::GeocodeDestination,
            Stage::Route,
        ] {
            assert_eq!(Stage::from_u8(stage as u8), stage);
        }
    }
}

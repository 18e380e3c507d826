//! `MapRoute` - conversational driving directions
//!
//! This library turns messages such as "directions from Lagos to Abuja"
//! into a driving route summary: it parses the message, geocodes both
//! places concurrently, asks a routing provider for the route and formats
//! the reply for the messaging platform.

pub mod api;
pub mod config;
pub mod error;
pub mod formatter;
pub mod geocoding;
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod retry;
pub mod routing;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use config::MapRouteConfig;
pub use error::{
    FailureReason, GeocodeError, MapRouteError, ParseError, ParseReason, ProviderFailure,
    ResolutionError, RouteError, Stage,
};
pub use formatter::ResponseFormatter;
pub use geocoding::{Geocoder, LocationIqGeocoder};
pub use models::{AgentReply, Coordinate, GeocodeResult, LocationQuery, ResolvedTrip, RouteSummary};
pub use orchestrator::RouteResolver;
pub use parser::{MessageParser, RouteRequest};
pub use retry::{RetryError, RetryPolicy};
pub use routing::{LocationIqRouter, RouteProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

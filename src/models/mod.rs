//! Data models for the MapRoute agent
//!
//! This module contains the request-scoped domain models organized by concern:
//! - Location: place queries, coordinates and geocoding results
//! - Route: route summaries and resolved trips
//! - Reply: the payload sent back to the messaging platform

pub mod location;
pub mod reply;
pub mod route;

// Re-export all public types for convenient access
pub use location::{Coordinate, GeocodeResult, LocationQuery};
pub use reply::{AgentReply, Attachment, AttachmentKind, ErrorMetadata, ReplyMetadata, RouteMetadata};
pub use route::{ResolvedTrip, RouteSummary};

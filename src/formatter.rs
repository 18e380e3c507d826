//! Reply formatting
//!
//! The only place a `ResolutionError` becomes user-facing text. Provider
//! detail never reaches the reply; the stage and reason tags travel in the
//! metadata instead.

use crate::error::{FailureReason, ParseReason, ProviderFailure, ResolutionError, Stage};
use crate::models::{
    AgentReply, Attachment, AttachmentKind, ErrorMetadata, ReplyMetadata, ResolvedTrip,
    RouteMetadata,
};

const MAP_LINK_TITLE: &str = "📍 View on Google Maps";

const HELP_TEXT: &str = "👋 Hi! I'm your MapRoute assistant.\n\n\
    I can help you find directions between locations.\n\n\
    Try asking:\n\
    • 'directions from Lagos to Abuja'\n\
    • 'route from New York to Boston'\n\
    • 'how to get from Paris to London'";

const USAGE_HINT: &str = "Please use the format:\n\
    'directions from [origin] to [destination]'\n\n\
    Example: 'directions from Lagos to Abuja'";

pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Reply for a successfully resolved trip
    #[must_use]
    pub fn format(trip: &ResolvedTrip) -> AgentReply {
        let route = &trip.route;
        let text = format!(
            "🚗 Route from {} to {}:\n📏 Distance: {:.2} km\n⏱️ Estimated time: {}",
            trip.origin_label,
            trip.destination_label,
            route.distance_km,
            format_duration(route.duration_minutes)
        );

        AgentReply {
            text,
            attachments: vec![Attachment {
                kind: AttachmentKind::Link,
                url: map_link(trip),
                title: MAP_LINK_TITLE.to_string(),
            }],
            quick_replies: Vec::new(),
            metadata: Some(ReplyMetadata::Route(RouteMetadata {
                distance_km: route.distance_km,
                duration_minutes: route.duration_minutes,
            })),
        }
        .with_quick_replies(&["Get another route", "Help"])
    }

    /// Reply for a failed resolution, keyed by stage tag and refined by reason.
    /// Metadata carries the stage that failed (or was in flight on timeout).
    #[must_use]
    pub fn format_error(error: &ResolutionError) -> AgentReply {
        let metadata = ReplyMetadata::Error(ErrorMetadata {
            stage: error.stage.as_str().to_string(),
            reason: error.reason.as_str().to_string(),
        });
        if error.reason == FailureReason::Parse(ParseReason::NoPattern) {
            return AgentReply {
                metadata: Some(metadata),
                ..Self::help()
            };
        }

        let (text, quick_replies): (String, &[&str]) = match (error.stage, error.reason) {
            (_, FailureReason::Timeout) => (
                "⏳ Sorry, that took too long to work out. \
                 The map services are slow right now, please try again in a moment."
                    .to_string(),
                &["Try again", "Help"],
            ),
            (_, FailureReason::Parse(reason)) => (parse_error_text(reason), &["Help", "Try again"]),
            (Stage::Route, FailureReason::Provider(failure)) => {
                (route_error_text(failure), &["Try different locations", "Help"])
            }
            (stage, FailureReason::Provider(failure)) => {
                let side = if stage == Stage::GeocodeDestination {
                    "destination"
                } else {
                    "starting point"
                };
                (geocode_error_text(side, failure), &["Try different locations", "Help"])
            }
        };

        AgentReply {
            metadata: Some(metadata),
            ..AgentReply::text(text)
        }
        .with_quick_replies(quick_replies)
    }

    /// Usage reply for messages that are not route requests at all
    #[must_use]
    pub fn help() -> AgentReply {
        AgentReply::text(HELP_TEXT).with_quick_replies(&["Get directions", "Example route"])
    }
}

/// "H hours M min", floored; "M min" alone under an hour
#[must_use]
pub fn format_duration(total_minutes: f64) -> String {
    let total = total_minutes.max(0.0).floor() as u64;
    let (hours, minutes) = (total / 60, total % 60);
    match hours {
        0 => format!("{minutes} min"),
        1 => format!("1 hour {minutes} min"),
        _ => format!("{hours} hours {minutes} min"),
    }
}

fn map_link(trip: &ResolvedTrip) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}",
        trip.route.origin.format_short(),
        trip.route.destination.format_short()
    )
}

fn parse_error_text(reason: ParseReason) -> String {
    let problem = match reason {
        ParseReason::MissingOrigin => "I couldn't tell where you're starting from.",
        ParseReason::MissingDestination => "I couldn't tell where you want to go.",
        ParseReason::InvalidOrigin => "That starting point doesn't look like a place name.",
        ParseReason::InvalidDestination => "That destination doesn't look like a place name.",
        ParseReason::NoPattern => "I couldn't understand your request.",
    };
    format!("❌ {problem}\n\n{USAGE_HINT}")
}

fn geocode_error_text(side: &str, failure: ProviderFailure) -> String {
    match failure {
        ProviderFailure::NotFound => format!(
            "❌ Sorry, I couldn't find your {side} on the map.\n\n\
             Please check the spelling or add a city or country and try again."
        ),
        ProviderFailure::ProviderUnavailable | ProviderFailure::BadResponse => format!(
            "⚠️ Sorry, I couldn't look up your {side} right now.\n\n\
             The location service is temporarily unavailable, please try again shortly."
        ),
    }
}

fn route_error_text(failure: ProviderFailure) -> String {
    match failure {
        ProviderFailure::NotFound => "❌ Sorry, I couldn't find a drivable route between those places.\n\n\
             They may be separated by water or have no road connection."
            .to_string(),
        ProviderFailure::ProviderUnavailable | ProviderFailure::BadResponse => {
            "⚠️ Sorry, I found both places but couldn't calculate a route right now.\n\n\
             The routing service is temporarily unavailable, please try again shortly."
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, RouteSummary};
    use rstest::rstest;

    fn trip(distance_km: f64, duration_minutes: f64) -> ResolvedTrip {
        ResolvedTrip {
            origin_label: "Lagos".to_string(),
            destination_label: "Abuja".to_string(),
            origin_match: "Lagos, Nigeria".to_string(),
            destination_match: "Abuja, Nigeria".to_string(),
            route: RouteSummary {
                distance_km,
                duration_minutes,
                origin: Coordinate::new(6.45, 3.39).unwrap(),
                destination: Coordinate::new(9.06, 7.49).unwrap(),
                geometry: None,
            },
        }
    }

    #[rstest]
    #[case(330.0, "5 hours 30 min")]
    #[case(330.9, "5 hours 30 min")]
    #[case(60.0, "1 hour 0 min")]
    #[case(95.5, "1 hour 35 min")]
    #[case(45.0, "45 min")]
    #[case(0.4, "0 min")]
    fn test_format_duration(#[case] minutes: f64, #[case] expected: &str) {
        assert_eq!(format_duration(minutes), expected);
    }

    #[test]
    fn test_success_reply() {
        let reply = ResponseFormatter::format(&trip(461.0, 330.0));

        assert_eq!(
            reply.text,
            "🚗 Route from Lagos to Abuja:\n📏 Distance: 461.00 km\n⏱️ Estimated time: 5 hours 30 min"
        );
        assert_eq!(reply.attachments.len(), 1);
        assert_eq!(reply.attachments[0].kind, AttachmentKind::Link);
        assert_eq!(
            reply.attachments[0].url,
            "https://www.google.com/maps/dir/?api=1&origin=6.45,3.39&destination=9.06,7.49"
        );
        assert_eq!(reply.attachments[0].title, MAP_LINK_TITLE);
        assert_eq!(
            reply.metadata,
            Some(ReplyMetadata::Route(RouteMetadata {
                distance_km: 461.0,
                duration_minutes: 330.0,
            }))
        );
        assert_eq!(reply.quick_replies, vec!["Get another route", "Help"]);
    }

    #[test]
    fn test_success_reply_is_deterministic() {
        let first = serde_json::to_vec(&ResponseFormatter::format(&trip(123.45, 67.8))).unwrap();
        let second = serde_json::to_vec(&ResponseFormatter::format(&trip(123.45, 67.8))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_metadata_keeps_unrounded_minutes() {
        let reply = ResponseFormatter::format(&trip(12.34, 95.5));
        assert!(reply.text.ends_with("1 hour 35 min"));
        assert_eq!(
            reply.metadata,
            Some(ReplyMetadata::Route(RouteMetadata {
                distance_km: 12.34,
                duration_minutes: 95.5,
            }))
        );
    }

    #[rstest]
    #[case(ResolutionError::from(crate::error::ParseError::new(ParseReason::MissingDestination)))]
    #[case(ResolutionError::timeout(Stage::GeocodeOrigin))]
    #[case(ResolutionError::timeout(Stage::Route))]
    #[case(ResolutionError { stage: Stage::GeocodeOrigin, reason: FailureReason::Provider(ProviderFailure::NotFound) })]
    #[case(ResolutionError { stage: Stage::GeocodeDestination, reason: FailureReason::Provider(ProviderFailure::NotFound) })]
    #[case(ResolutionError { stage: Stage::Route, reason: FailureReason::Provider(ProviderFailure::ProviderUnavailable) })]
    fn test_error_metadata_carries_tags(#[case] error: ResolutionError) {
        let reply = ResponseFormatter::format_error(&error);
        assert!(reply.attachments.is_empty());
        assert!(!reply.quick_replies.is_empty());
        assert_eq!(
            reply.metadata,
            Some(ReplyMetadata::Error(ErrorMetadata {
                stage: error.stage.as_str().to_string(),
                reason: error.reason.as_str().to_string(),
            }))
        );
    }

    #[test]
    fn test_error_text_is_distinct_per_stage_tag() {
        let texts: Vec<String> = [
            ResolutionError::from(crate::error::ParseError::new(ParseReason::MissingOrigin)),
            ResolutionError::geocode(
                Stage::GeocodeOrigin,
                &crate::error::GeocodeError::new(ProviderFailure::NotFound, "x"),
            ),
            ResolutionError::geocode(
                Stage::GeocodeDestination,
                &crate::error::GeocodeError::new(ProviderFailure::NotFound, "x"),
            ),
            ResolutionError::from(crate::error::RouteError::new(ProviderFailure::NotFound, "x")),
            ResolutionError::timeout(Stage::Route),
        ]
        .iter()
        .map(|e| ResponseFormatter::format_error(e).text)
        .collect();

        for (i, a) in texts.iter().enumerate() {
            for b in &texts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_error_text_never_contains_provider_detail() {
        let error = ResolutionError::from(crate::error::RouteError::new(
            ProviderFailure::BadResponse,
            "HTTP 502 upstream secret-token",
        ));
        let reply = ResponseFormatter::format_error(&error);
        assert!(!reply.text.contains("502"));
        assert!(!reply.text.contains("secret-token"));
    }

    #[test]
    fn test_no_pattern_gets_help_text() {
        let error = ResolutionError::from(crate::error::ParseError::new(ParseReason::NoPattern));
        let reply = ResponseFormatter::format_error(&error);
        assert_eq!(reply.text, ResponseFormatter::help().text);
        assert_eq!(reply.quick_replies, vec!["Get directions", "Example route"]);
        assert_eq!(
            reply.metadata,
            Some(ReplyMetadata::Error(ErrorMetadata {
                stage: "parse".to_string(),
                reason: "no_pattern".to_string(),
            }))
        );
    }
}

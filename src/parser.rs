//! Message parsing
//!
//! Extracts an origin/destination pair from free-form text such as
//! "directions from Lagos to Abuja" or "how do I get to Paris from London?".
//! Pure functions only; no I/O happens here.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ParseError, ParseReason};
use crate::models::LocationQuery;

const MIN_LOCATION_LENGTH: usize = 2;
const MAX_LOCATION_LENGTH: usize = 100;

/// Characters stripped from both ends of an extracted place name
const EDGE_PUNCTUATION: &[char] = &['?', '!', '.', ',', ';', ':', '"', '\'', '(', ')'];

/// Characters removed anywhere inside a place name
const UNSAFE_CHARACTERS: &[char] = &['<', '>', '\'', '"', ';'];

/// Words that mark a message as a directions request even without "from"
const ROUTE_KEYWORDS: &[&str] = &[
    "direction", "directions", "route", "navigate", "drive", "get", "way", "go",
];

static FORWARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bfrom\s+(?P<origin>.+?)\s+to\s+(?P<destination>.+)$")
        .expect("forward route pattern is valid")
});

// Greedy prefix so the last "to" before "from" wins ("how to get to X from Y").
static REVERSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^.*\bto\s+(?P<destination>.+?)\s+from\s+(?P<origin>.+)$")
        .expect("reversed route pattern is valid")
});

static BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bbetween\s+(?P<origin>.+?)\s+and\s+(?P<destination>.+)$")
        .expect("between route pattern is valid")
});

/// Origin and destination extracted from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub origin: LocationQuery,
    pub destination: LocationQuery,
}

/// Route request parsing utilities
pub struct MessageParser;

impl MessageParser {
    /// Parse a message into an origin/destination pair
    pub fn parse(message: &str) -> Result<RouteRequest, ParseError> {
        let message = message.trim();

        let Some((origin, destination)) = Self::extract(message) else {
            let reason = Self::diagnose(message);
            debug!("Could not parse route request ({}): {:?}", reason, message);
            return Err(ParseError::new(reason));
        };

        let origin = Self::trim_edges(origin);
        let destination = Self::trim_edges(destination);
        if origin.is_empty() {
            return Err(ParseError::new(ParseReason::MissingOrigin));
        }
        if destination.is_empty() {
            return Err(ParseError::new(ParseReason::MissingDestination));
        }

        let origin = Self::sanitize(origin);
        let destination = Self::sanitize(destination);
        if !Self::is_valid_location(&origin) {
            return Err(ParseError::new(ParseReason::InvalidOrigin));
        }
        if !Self::is_valid_location(&destination) {
            return Err(ParseError::new(ParseReason::InvalidDestination));
        }

        debug!("Parsed request: {} -> {}", origin, destination);
        Ok(RouteRequest {
            origin: LocationQuery::new(origin),
            destination: LocationQuery::new(destination),
        })
    }

    fn extract(message: &str) -> Option<(&str, &str)> {
        [&*FORWARD, &*REVERSED, &*BETWEEN]
            .into_iter()
            .find_map(|pattern| pattern.captures(message))
            .and_then(|captures| {
                let origin = captures.name("origin")?.as_str();
                let destination = captures.name("destination")?.as_str();
                Some((origin, destination))
            })
    }

    /// Work out which half of the request is missing when no pattern matched
    fn diagnose(message: &str) -> ParseReason {
        let words: Vec<String> = message
            .split_whitespace()
            .map(|w| Self::trim_edges(w).to_lowercase())
            .collect();
        let position = |word: &str| words.iter().position(|w| w == word);

        if let Some(from) = position("from") {
            return match words.get(from + 1).map(String::as_str) {
                None | Some("to") => {
                    if words[from + 1..].iter().any(|w| w == "to") {
                        ParseReason::MissingOrigin
                    } else {
                        ParseReason::MissingDestination
                    }
                }
                Some(_) => ParseReason::MissingDestination,
            };
        }
        if position("between").is_some() {
            return ParseReason::MissingDestination;
        }
        let mentions_route = words.iter().any(|w| ROUTE_KEYWORDS.contains(&w.as_str()));
        if mentions_route && position("to").is_some() {
            return ParseReason::MissingOrigin;
        }
        ParseReason::NoPattern
    }

    fn trim_edges(text: &str) -> &str {
        text.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
    }

    /// Collapse whitespace and drop characters that have no place in a place name
    #[must_use]
    pub fn sanitize(location: &str) -> String {
        location
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .filter(|c| !UNSAFE_CHARACTERS.contains(c))
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn is_valid_location(location: &str) -> bool {
        let length = location.chars().count();
        (MIN_LOCATION_LENGTH..=MAX_LOCATION_LENGTH).contains(&length)
            && location.chars().any(char::is_alphanumeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parsed(message: &str) -> (String, String) {
        let request = MessageParser::parse(message).unwrap();
        (
            request.origin.as_str().to_string(),
            request.destination.as_str().to_string(),
        )
    }

    #[rstest]
    #[case("directions from Lagos to Abuja", "Lagos", "Abuja")]
    #[case("Direction from Lagos to Abuja", "Lagos", "Abuja")]
    #[case("ROUTE FROM New York TO Boston", "New York", "Boston")]
    #[case("how to get from Paris to London?", "Paris", "London")]
    #[case("navigate from Accra to Kumasi.", "Accra", "Kumasi")]
    #[case("from Toronto to Ottawa", "Toronto", "Ottawa")]
    #[case("  from   Lagos,   Nigeria   to Accra, Ghana!!  ", "Lagos, Nigeria", "Accra, Ghana")]
    #[case("how do I get to Abuja from Lagos?", "Lagos", "Abuja")]
    #[case("route between Nairobi and Mombasa", "Nairobi", "Mombasa")]
    #[case("\"directions from 'Port Harcourt' to Enugu\"", "Port Harcourt", "Enugu")]
    fn test_parses_directional_phrasings(
        #[case] message: &str,
        #[case] origin: &str,
        #[case] destination: &str,
    ) {
        assert_eq!(parsed(message), (origin.to_string(), destination.to_string()));
    }

    #[rstest]
    #[case("hello there", ParseReason::NoPattern)]
    #[case("", ParseReason::NoPattern)]
    #[case("I want to relax", ParseReason::NoPattern)]
    #[case("directions from Lagos", ParseReason::MissingDestination)]
    #[case("from Lagos to", ParseReason::MissingDestination)]
    #[case("route between Lagos", ParseReason::MissingDestination)]
    #[case("directions from to Abuja", ParseReason::MissingOrigin)]
    #[case("directions to Abuja", ParseReason::MissingOrigin)]
    #[case("from ?? to Abuja", ParseReason::MissingOrigin)]
    #[case("from Lagos to ...", ParseReason::MissingDestination)]
    #[case("from X to Abuja", ParseReason::InvalidOrigin)]
    #[case("from Lagos to <>;", ParseReason::InvalidDestination)]
    fn test_rejects_unusable_messages(#[case] message: &str, #[case] reason: ParseReason) {
        assert_eq!(MessageParser::parse(message), Err(ParseError::new(reason)));
    }

    #[test]
    fn test_rejects_overlong_location() {
        let message = format!("from Lagos to {}", "a".repeat(MAX_LOCATION_LENGTH + 1));
        assert_eq!(
            MessageParser::parse(&message),
            Err(ParseError::new(ParseReason::InvalidDestination))
        );
    }

    #[test]
    fn test_keeps_user_casing_and_country_qualifiers() {
        let (origin, destination) = parsed("Directions From São Paulo, Brazil To Rio de Janeiro");
        assert_eq!(origin, "São Paulo, Brazil");
        assert_eq!(destination, "Rio de Janeiro");
    }

    #[test]
    fn test_parsed_pair_survives_reformatting() {
        let (origin, destination) = parsed("directions from Lagos to Abuja");
        let rebuilt = format!("route from {origin} to {destination}");
        assert_eq!(parsed(&rebuilt), (origin, destination));
    }

    #[test]
    fn test_sanitize_collapses_whitespace_and_strips_unsafe_characters() {
        assert_eq!(MessageParser::sanitize("  New \t York<script>  "), "New Yorkscript");
        assert_eq!(MessageParser::sanitize("O'Hare"), "OHare");
    }
}

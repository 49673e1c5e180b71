//! Error types for route-string parsing, leg expansion, and route mutation.

use thiserror::Error;

/// Failure modes for route construction and mutation.
///
/// Construction-time failures are all-or-nothing: no partially built leg or
/// route is ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route string `{0}` contains whitespace")]
    WhitespaceInRouteString(String),

    #[error("route segment `{0}` does not match the route-string grammar")]
    MalformedSegment(String),

    #[error("vector token `{0}` does not encode a heading of 001-360 degrees")]
    InvalidVectorHeading(String),

    #[error("restriction notation `{0}` is not parseable")]
    InvalidRestriction(String),

    #[error("hold leg length `{0}` is not of the form `<n>min` or `<n>nm`")]
    InvalidHoldLegLength(String),

    #[error("unknown fix `{0}`")]
    UnknownFix(String),

    #[error("unknown procedure or airway `{0}`")]
    UnknownProcedure(String),

    #[error("procedure `{procedure}` has no entry `{entry}`")]
    InvalidEntry { procedure: String, entry: String },

    #[error("procedure `{procedure}` has no exit `{exit}`")]
    InvalidExit { procedure: String, exit: String },

    #[error("segment `{0}` expands to no waypoints")]
    EmptyLeg(String),

    #[error("route `{0}` resolves to fewer than two waypoints")]
    TooFewWaypoints(String),
}

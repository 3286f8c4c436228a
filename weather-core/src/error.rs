//! Typed failures of a weather query.
//!
//! Every failure is recovered at the client boundary and surfaced with one
//! user-facing message per kind. The origin of the lookup travels with the
//! error so a front end can word the message for it.

use std::fmt;

use crate::model::QueryOrigin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure (DNS, connect, TLS, reading the body).
    NetworkFailure,
    /// The provider answered with a non-success status.
    NotFound,
    /// The body was not JSON or lacked expected fields.
    MalformedResponse,
    /// A request exceeded the configured timeout.
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::NetworkFailure => "network failure",
            ErrorKind::NotFound => "not found",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Timeout => "timeout",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} during {origin} lookup: {detail}")]
pub struct QueryError {
    pub kind: ErrorKind,
    pub origin: QueryOrigin,
    pub detail: String,
}

impl QueryError {
    pub fn new(kind: ErrorKind, origin: QueryOrigin, detail: impl Into<String>) -> Self {
        Self { kind, origin, detail: detail.into() }
    }

    /// Map a reqwest failure onto a kind.
    pub(crate) fn from_transport(origin: QueryOrigin, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() { ErrorKind::Timeout } else { ErrorKind::NetworkFailure };
        Self::new(kind, origin, err.to_string())
    }

    /// Message suitable for showing to the person who asked.
    pub fn user_message(&self) -> &'static str {
        match (self.kind, self.origin) {
            (ErrorKind::NotFound, QueryOrigin::City) => "City not found. Please try again.",
            (ErrorKind::NotFound, QueryOrigin::Coordinates) => {
                "Weather data unavailable for your location."
            }
            (ErrorKind::NetworkFailure, _) => {
                "Unable to reach the weather service. Check your connection."
            }
            (ErrorKind::Timeout, _) => "The weather service took too long to respond.",
            (ErrorKind::MalformedResponse, _) => {
                "The weather service returned data we could not read."
            }
        }
    }
}

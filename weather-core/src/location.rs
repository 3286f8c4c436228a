//! Resolution of what a weather query is about: device coordinates or a
//! typed place name.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::model::QueryTarget;

/// How long the startup geolocation attempt may take.
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// Host capability that may report where the device is.
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A position known up front, e.g. from command-line flags or the `home`
/// section of the config file.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl GeolocationSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Host without any geolocation capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationSource for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable)
    }
}

pub struct LocationResolver {
    source: Box<dyn GeolocationSource>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(source: Box<dyn GeolocationSource>) -> Self {
        Self { source, timeout: DEFAULT_GEOLOCATION_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One best-effort geolocation attempt. No retry; `None` when denied,
    /// unavailable or too slow.
    pub async fn resolve_startup(&self) -> Option<QueryTarget> {
        let outcome = tokio::time::timeout(self.timeout, self.source.current_position())
            .await
            .unwrap_or(Err(LocationError::Timeout));

        match outcome {
            Ok(Coordinates { lat, lon }) => {
                debug!(lat, lon, "Geolocation granted");
                Some(QueryTarget::coordinates(lat, lon))
            }
            Err(err) => {
                info!(reason = %err, "No device location, waiting for a city");
                None
            }
        }
    }

    /// Target for a manual submission. Blank input produces nothing.
    pub fn from_submission(input: &str) -> Option<QueryTarget> {
        QueryTarget::city(input)
    }
}

//! Error types surfaced by the advisory engine.
//!
//! Every error returned from an engine operation is terminal to the request:
//! callers never receive a partial advisory or fallback weather values.

use std::time::Duration;

use thiserror::Error;

use crate::model::VesselId;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error(
        "Invalid coordinate ({lat}, {lon}): latitude must be within [-90, 90] and longitude within [-180, 180]"
    )]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid forecast day {0}: expected a day between 0 and 9")]
    InvalidForecastDay(u8),

    #[error("Invalid baseline speed {0} kn: must be finite and non-negative")]
    InvalidBaseline(f64),

    #[error("Invalid search radius {0} km: must be finite and non-negative")]
    InvalidRadius(f64),

    #[error("No forecast available for ({lat:.2}, {lon:.2}) on day {day}")]
    NoForecastAvailable { lat: f64, lon: f64, day: u8 },

    #[error("Forecast provider unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),

    #[error("Vessel {0} not found")]
    NotFound(VesselId),

    #[error("Access denied to vessel {0}")]
    AccessDenied(VesselId),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Failure reported by an upstream forecast provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("{0}")]
    Permanent(String),
}

impl ProviderError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::Transient(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("record {0} does not exist")]
    MissingRecord(String),
}

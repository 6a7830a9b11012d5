//! Coalescing of repeated advisory requests from nearly the same place.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AdvisorySettings;
use crate::geo::Coordinate;
use crate::model::SpeedAdvisory;

/// What the recency guard did with a freshly computed recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// A new advisory row was appended.
    Created,
    /// The vessel's latest advisory was updated in place.
    Refreshed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyPolicy {
    pub window: Duration,
    pub tolerance_deg: f64,
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            window: Duration::hours(1),
            tolerance_deg: 0.01,
        }
    }
}

impl From<&AdvisorySettings> for RecencyPolicy {
    /// Windows too large for a `chrono::Duration` saturate to `Duration::MAX`.
    fn from(settings: &AdvisorySettings) -> Self {
        let window = i64::try_from(settings.coalesce_window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);

        Self {
            window,
            tolerance_deg: settings.coalesce_tolerance_deg,
        }
    }
}

impl RecencyPolicy {
    /// True when `last` is recent and close enough to be refreshed in place.
    ///
    /// Positions are compared as canonical hundredths so a one-step move
    /// (exactly 0.01 deg) never slips under a 0.01 tolerance through float error.
    pub fn should_coalesce(
        &self,
        last: &SpeedAdvisory,
        position: Coordinate,
        now: DateTime<Utc>,
    ) -> bool {
        if now - last.timestamp >= self.window {
            return false;
        }

        let (last_lat, last_lon) = last.position.hundredths();
        let (lat, lon) = position.hundredths();

        self.within_tolerance(last_lat, lat) && self.within_tolerance(last_lon, lon)
    }

    fn within_tolerance(&self, a_e2: i32, b_e2: i32) -> bool {
        f64::from((a_e2 - b_e2).abs()) / 100.0 < self.tolerance_deg
    }
}

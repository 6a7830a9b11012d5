//! Alert severity and its presentation order.

use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::HazardAlert;

/// Declaration order is the ranking order: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric rank, 1 (low) to 4 (critical).
    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most severe first. Stable, so equal severities keep their storage order.
pub fn sort_by_severity(alerts: &mut [HazardAlert]) {
    alerts.sort_by_key(|alert| Reverse(alert.severity));
}

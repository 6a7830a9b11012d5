pub mod calculator;
pub mod recency;

pub use calculator::{DEFAULT_BASELINE_KNOTS, recommend_speed};
pub use recency::{Disposition, RecencyPolicy};

use serde::{Deserialize, Serialize};

use crate::model::SpeedAdvisory;

/// Outcome of an advisory request: the persisted row and how it got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedAdvisoryResult {
    pub advisory: SpeedAdvisory,
    pub disposition: Disposition,
}

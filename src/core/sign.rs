//! Shared positive/negative/neutral classification of money figures.
use serde::{Deserialize, Serialize};

/// Moves smaller than half a cent read as no change.
const NEUTRAL_BAND: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Neutral,
}

impl Sign {
    pub fn of(value: f64) -> Self {
        if !value.is_finite() || value.abs() < NEUTRAL_BAND {
            Sign::Neutral
        } else if value > 0.0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }
}

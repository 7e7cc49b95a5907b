//! Sensor samples — one proximity and one lux reading taken together.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// The two physical sensors of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Proximity sensor facing the mailbox floor (mail detection).
    Proximity,
    /// Ambient light sensor (door detection).
    Lux,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proximity => f.write_str("proximity"),
            Self::Lux => f.write_str("lux"),
        }
    }
}

/// A single acquisition of both sensors.
///
/// A `None` reading means the sensor failed or returned an unusable value
/// during this tick. It is never replaced by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub proximity: Option<f64>,
    pub lux: Option<f64>,
    pub sampled_at: Timestamp,
}

impl SensorSample {
    #[must_use]
    pub fn new(proximity: Option<f64>, lux: Option<f64>, sampled_at: Timestamp) -> Self {
        Self {
            proximity,
            lux,
            sampled_at,
        }
    }

    /// Whether neither sensor produced a reading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proximity.is_none() && self.lux.is_none()
    }
}

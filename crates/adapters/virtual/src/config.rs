//! Virtual sensor script configuration.

use serde::Deserialize;

/// One scripted acquisition. A missing value simulates a failed read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Step {
    pub proximity: Option<f64>,
    pub lux: Option<f64>,
}

impl Step {
    #[must_use]
    pub const fn new(proximity: Option<f64>, lux: Option<f64>) -> Self {
        Self { proximity, lux }
    }
}

/// Configuration for the virtual sensor reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VirtualSensorConfig {
    /// Steps replayed in order, wrapping around at the end.
    pub steps: Vec<Step>,
}

/// A mailbox day under the default thresholds (mail above 2000, open above
/// 500 lux): postman opens the door, drops a parcel, closes; one proximity
/// glitch; owner opens, collects, closes.
const MAILBOX_DAY: [Step; 10] = [
    Step::new(Some(1200.0), Some(3.0)),
    Step::new(Some(1200.0), Some(3.0)),
    Step::new(Some(1300.0), Some(820.0)),
    Step::new(Some(2600.0), Some(790.0)),
    Step::new(Some(2550.0), Some(4.0)),
    Step::new(None, Some(4.0)),
    Step::new(Some(2580.0), Some(2.0)),
    Step::new(Some(2500.0), Some(910.0)),
    Step::new(Some(1150.0), Some(880.0)),
    Step::new(Some(1180.0), Some(5.0)),
];

impl Default for VirtualSensorConfig {
    fn default() -> Self {
        Self {
            steps: MAILBOX_DAY.to_vec(),
        }
    }
}

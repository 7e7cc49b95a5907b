//! # mailbox-adapter-virtual
//!
//! Virtual sensor adapter that replays scripted readings in place of the
//! proximity and ambient-light hardware.
//!
//! Each sensor keeps its own cursor into the script and wraps around at the
//! end, so the loop sees a repeating mailbox day.
//!
//! | Scripted value | Read result |
//! |----------------|-------------|
//! | missing | [`SensorError::Unavailable`] |
//! | negative or non-finite | [`SensorError::OutOfRange`] |
//! | anything else | the value |
//!
//! ## Dependency rule
//!
//! Depends on `mailbox-app` (port traits) and `mailbox-domain` only.

mod config;

pub use config::{Step, VirtualSensorConfig};

use std::future::Future;

use mailbox_app::ports::SensorReader;
use mailbox_domain::error::SensorError;
use mailbox_domain::sample::SensorKind;

/// Scripted stand-in for the mailbox sensors.
pub struct VirtualSensorReader {
    steps: Vec<Step>,
    proximity_cursor: usize,
    lux_cursor: usize,
}

impl VirtualSensorReader {
    #[must_use]
    pub fn new(config: VirtualSensorConfig) -> Self {
        if config.steps.is_empty() {
            tracing::warn!("virtual sensor script is empty, every read will fail");
        }
        Self {
            steps: config.steps,
            proximity_cursor: 0,
            lux_cursor: 0,
        }
    }

    fn next(&mut self, sensor: SensorKind) -> Result<f64, SensorError> {
        if self.steps.is_empty() {
            return Err(SensorError::Unavailable { sensor });
        }
        let cursor = match sensor {
            SensorKind::Proximity => &mut self.proximity_cursor,
            SensorKind::Lux => &mut self.lux_cursor,
        };
        let step = self.steps[*cursor];
        *cursor = (*cursor + 1) % self.steps.len();

        let value = match sensor {
            SensorKind::Proximity => step.proximity,
            SensorKind::Lux => step.lux,
        };
        check_range(sensor, value)
    }
}

impl Default for VirtualSensorReader {
    fn default() -> Self {
        Self::new(VirtualSensorConfig::default())
    }
}

impl SensorReader for VirtualSensorReader {
    fn read_proximity(&mut self) -> impl Future<Output = Result<f64, SensorError>> + Send {
        let result = self.next(SensorKind::Proximity);
        async move { result }
    }

    fn read_lux(&mut self) -> impl Future<Output = Result<f64, SensorError>> + Send {
        let result = self.next(SensorKind::Lux);
        async move { result }
    }
}

fn check_range(sensor: SensorKind, value: Option<f64>) -> Result<f64, SensorError> {
    match value {
        None => Err(SensorError::Unavailable { sensor }),
        Some(v) if !v.is_finite() || v < 0.0 => Err(SensorError::OutOfRange { sensor, value: v }),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(steps: &[Step]) -> VirtualSensorReader {
        VirtualSensorReader::new(VirtualSensorConfig {
            steps: steps.to_vec(),
        })
    }

    #[tokio::test]
    async fn should_replay_steps_in_order_and_wrap() {
        let mut reader = reader(&[
            Step::new(Some(10.0), Some(1.0)),
            Step::new(Some(20.0), Some(2.0)),
        ]);

        assert_eq!(reader.read_proximity().await.unwrap(), 10.0);
        assert_eq!(reader.read_lux().await.unwrap(), 1.0);
        assert_eq!(reader.read_proximity().await.unwrap(), 20.0);
        assert_eq!(reader.read_lux().await.unwrap(), 2.0);
        assert_eq!(reader.read_proximity().await.unwrap(), 10.0);
    }

    #[tokio::test]
    async fn should_keep_independent_cursors_per_sensor() {
        let mut reader = reader(&[
            Step::new(Some(10.0), Some(1.0)),
            Step::new(Some(20.0), Some(2.0)),
        ]);

        reader.read_proximity().await.unwrap();
        reader.read_proximity().await.unwrap();

        assert_eq!(reader.read_lux().await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn should_report_missing_value_as_unavailable() {
        let mut reader = reader(&[Step::new(None, Some(5.0))]);

        let err = reader.read_proximity().await.unwrap_err();

        assert!(matches!(
            err,
            SensorError::Unavailable {
                sensor: SensorKind::Proximity
            }
        ));
    }

    #[tokio::test]
    async fn should_report_negative_value_as_out_of_range() {
        let mut reader = reader(&[Step::new(Some(1.0), Some(-3.0))]);

        let err = reader.read_lux().await.unwrap_err();

        assert!(matches!(
            err,
            SensorError::OutOfRange {
                sensor: SensorKind::Lux,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn should_fail_every_read_with_empty_script() {
        let mut reader = reader(&[]);

        assert!(reader.read_proximity().await.is_err());
        assert!(reader.read_lux().await.is_err());
    }

    #[tokio::test]
    async fn should_replay_default_mailbox_day() {
        let mut reader = VirtualSensorReader::default();
        let mut proximity = Vec::new();
        for _ in 0..10 {
            proximity.push(reader.read_proximity().await.ok());
        }
        assert_eq!(proximity.iter().filter(|p| p.is_none()).count(), 1);
        assert_eq!(proximity[3], Some(2600.0));
    }
}

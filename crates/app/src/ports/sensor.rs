//! Sensor port — acquisition of raw proximity and lux readings.

use std::future::Future;

use mailbox_domain::error::SensorError;

/// Reads the two mailbox sensors.
///
/// Implementations map driver failures and out-of-range values to
/// [`SensorError`]; they must not panic. The poll loop owns the reader
/// exclusively, hence `&mut self`.
pub trait SensorReader {
    /// Read the proximity sensor.
    fn read_proximity(&mut self) -> impl Future<Output = Result<f64, SensorError>> + Send;

    /// Read the ambient light sensor, in lux.
    fn read_lux(&mut self) -> impl Future<Output = Result<f64, SensorError>> + Send;
}

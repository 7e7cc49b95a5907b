//! Common error types used across the workspace.
//!
//! Each port boundary has its own typed error. Adapters define richer
//! errors of their own and convert into these when crossing a port.

use crate::sample::SensorKind;

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single sensor read failed or produced an unusable value.
///
/// The poll loop treats every variant as "value absent" for that tick.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The driver reported a failure.
    #[error("{sensor} sensor read failed")]
    Read {
        sensor: SensorKind,
        #[source]
        source: BoxError,
    },

    /// The driver returned a value outside the physically meaningful range.
    #[error("{sensor} reading {value} is out of range")]
    OutOfRange { sensor: SensorKind, value: f64 },

    /// The driver returned nothing at all.
    #[error("{sensor} sensor returned no value")]
    Unavailable { sensor: SensorKind },
}

impl SensorError {
    /// Which sensor the failure belongs to.
    #[must_use]
    pub fn sensor(&self) -> SensorKind {
        match self {
            Self::Read { sensor, .. }
            | Self::OutOfRange { sensor, .. }
            | Self::Unavailable { sensor } => *sensor,
        }
    }
}

/// A single publish call failed.
///
/// Never fatal: the poll loop logs it and tries again on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The publisher has no usable connection.
    #[error("publisher not connected")]
    NotConnected,

    /// The transport refused or could not queue the message.
    #[error("failed to publish to {topic}")]
    Rejected {
        topic: String,
        #[source]
        source: BoxError,
    },

    /// The payload could not be encoded.
    #[error("failed to encode payload")]
    Encode(#[from] serde_json::Error),

    /// The transport failed outside of a specific publish (e.g. disconnect).
    #[error("publisher transport error")]
    Transport(#[source] BoxError),
}

/// Domain invariant violations detected while building configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The device identifier is empty.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// A threshold is NaN or infinite.
    #[error("{name} must be a finite number")]
    NonFiniteThreshold { name: &'static str },

    /// The proximity validity bound is not a finite positive number.
    #[error("proximity_valid_max must be a finite positive number, got {0}")]
    InvalidValidMax(f64),

    /// A value used to build publish topics contains `+`, `#` or NUL.
    #[error("{name} {value:?} must not contain MQTT wildcards or NUL")]
    InvalidTopic { name: &'static str, value: String },

    /// The poll interval is zero.
    #[error("poll_interval_seconds must be non-zero")]
    ZeroPollInterval,
}

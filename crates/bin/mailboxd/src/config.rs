//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `mailbox.toml` in the working directory (or the file named by
//! `MAILBOX_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use mailbox_adapter_mqtt::MqttConfig;
use mailbox_adapter_virtual::VirtualSensorConfig;
use mailbox_domain::error::ValidationError;
use mailbox_domain::payload::{DeliveryQuality, OutputMode, PayloadBuilder};
use mailbox_domain::threshold::ThresholdConfig;

const DEFAULT_PATH: &str = "mailbox.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device identity.
    pub device: DeviceConfig,
    /// Mail and door detection thresholds.
    pub thresholds: ThresholdConfig,
    /// Loop cadence.
    pub polling: PollingConfig,
    /// Broker connection.
    pub mqtt: MqttConfig,
    /// Wire layout of published messages.
    pub output: OutputConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Script for the virtual sensors.
    pub virtual_sensor: VirtualSensorConfig,
}

/// Device identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identifier used in topics and payloads (e.g. `mailbox_01`).
    pub device_id: String,
}

/// Poll loop cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between the end of one tick and the start of the next.
    pub poll_interval_seconds: u64,
}

/// Output layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `COMBINED` or `DISCRETE`.
    pub output_mode: OutputMode,
    /// Discrete-mode topic prefix; defaults to `mailbox/{device_id}`.
    pub base_topic: Option<String>,
    /// Publish acknowledgement tier.
    pub quality: DeliveryQuality,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `mailbox.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override cannot be parsed, or the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MAILBOX_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("MAILBOX_DEVICE_ID") {
            self.device.device_id = val;
        }
        if let Some(val) = lookup("MAILBOX_BROKER_ADDRESS") {
            self.mqtt.broker_address = val;
        }
        if let Some(val) = lookup("MAILBOX_BROKER_PORT") {
            self.mqtt.broker_port = parse_env("MAILBOX_BROKER_PORT", &val)?;
        }
        if let Some(val) = lookup("MAILBOX_BROKER") {
            match val.rsplit_once(':') {
                Some((host, port)) => {
                    self.mqtt.broker_address = host.to_string();
                    self.mqtt.broker_port = parse_env("MAILBOX_BROKER", port)?;
                }
                None => self.mqtt.broker_address = val,
            }
        }
        if let Some(val) = lookup("MAILBOX_POLL_INTERVAL") {
            self.polling.poll_interval_seconds = parse_env("MAILBOX_POLL_INTERVAL", &val)?;
        }
        if let Some(val) = lookup("MAILBOX_OUTPUT_MODE") {
            self.output.output_mode = parse_env("MAILBOX_OUTPUT_MODE", &val)?;
        }
        if let Some(val) = lookup("MAILBOX_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.device.device_id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        self.thresholds.validate()?;
        self.payload_builder()?;
        if self.polling.poll_interval_seconds == 0 {
            return Err(ValidationError::ZeroPollInterval.into());
        }
        if self.mqtt.broker_address.is_empty() {
            return Err(ConfigError::Validation(
                "broker_address must not be empty".to_string(),
            ));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "broker_port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// MQTT client id: explicit `mqtt.client_id`, else the device id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.mqtt
            .client_id
            .as_deref()
            .unwrap_or(&self.device.device_id)
    }

    /// Delay between ticks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.poll_interval_seconds)
    }

    /// Build the payload builder for the configured device and output mode.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the device id is empty or the device
    /// id or base topic cannot form a publish topic.
    pub fn payload_builder(&self) -> Result<PayloadBuilder, ValidationError> {
        PayloadBuilder::new(
            self.device.device_id.clone(),
            self.output.output_mode,
            self.output.base_topic.clone(),
            self.output.quality,
        )
    }
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    value.parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "mailbox_01".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "mailboxd=info,mailbox=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
    /// A domain invariant does not hold.
    #[error("invalid configuration")]
    Invalid(#[from] ValidationError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

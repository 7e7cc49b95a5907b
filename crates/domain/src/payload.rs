//! Outbound payloads — what gets published after each evaluation.
//!
//! Two output modes are supported:
//!
//! | Mode | Messages per tick | Topic(s) | Retain |
//! |------|-------------------|----------|--------|
//! | `COMBINED` | 1 | `mailbox/{device_id}/sensors` (JSON record) | no |
//! | `DISCRETE` | 5 | `{base}/raw/lux`, `{base}/raw/proximity`, `{base}/status/door`, `{base}/status/mail`, `{base}/heartbeat` | yes |
//!
//! Absent readings are always rendered as an explicit `null`, never as `0`,
//! so consumers can tell "dark" from "sensor failed".

use std::fmt;
use std::str::FromStr;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::sample::SensorSample;
use crate::state::{MailboxState, StateTransitionResult};
use crate::threshold::ThresholdConfig;
use crate::time::Timestamp;

/// How readings and state are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputMode {
    /// One JSON record per tick.
    #[default]
    #[serde(alias = "combined")]
    Combined,
    /// One retained scalar per topic per tick.
    #[serde(alias = "discrete")]
    Discrete,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combined => f.write_str("COMBINED"),
            Self::Discrete => f.write_str("DISCRETE"),
        }
    }
}

/// Error returned when parsing an unknown [`OutputMode`].
#[derive(Debug, thiserror::Error)]
#[error("unknown output mode {0:?}, expected COMBINED or DISCRETE")]
pub struct UnknownOutputMode(pub String);

impl FromStr for OutputMode {
    type Err = UnknownOutputMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("combined") {
            Ok(Self::Combined)
        } else if s.eq_ignore_ascii_case("discrete") {
            Ok(Self::Discrete)
        } else {
            Err(UnknownOutputMode(s.to_string()))
        }
    }
}

/// Publish acknowledgement tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryQuality {
    /// Fire and forget.
    AtMostOnce,
    /// Broker acknowledges every message.
    #[default]
    AtLeastOnce,
}

/// Door status published in discrete mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorStatus {
    Open,
    Closed,
}

impl DoorStatus {
    #[must_use]
    pub fn from_open(is_open: bool) -> Self {
        if is_open { Self::Open } else { Self::Closed }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

/// Mail status published in discrete mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailStatus {
    NewMail,
    NoMail,
}

impl MailStatus {
    #[must_use]
    pub fn from_has_mail(has_mail: bool) -> Self {
        if has_mail { Self::NewMail } else { Self::NoMail }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewMail => "NEW_MAIL",
            Self::NoMail => "NO_MAIL",
        }
    }
}

/// Thresholds echoed in every combined record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEcho {
    pub proximity_mail_threshold_mm: f64,
    pub lux_open_threshold: f64,
}

/// The combined-mode JSON record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub device_id: String,
    pub timestamp: Timestamp,
    pub proximity_mm: Option<f64>,
    pub lux: Option<f64>,
    pub has_mail: bool,
    pub is_open: bool,
    pub state_changed: bool,
    pub last_mail_detected: Option<Timestamp>,
    pub last_opened: Option<Timestamp>,
    pub thresholds: ThresholdEcho,
}

/// The discrete-mode scalar set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteReport {
    pub lux: Option<f64>,
    pub proximity: Option<f64>,
    pub door: DoorStatus,
    pub mail: MailStatus,
    pub heartbeat: Timestamp,
}

/// Everything published for one tick, before rendering to wire messages.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    Combined(SensorRecord),
    Discrete(DiscreteReport),
}

/// A single message ready to hand to a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
    pub quality: DeliveryQuality,
    pub retain: bool,
}

/// Builds and renders outbound payloads for one device.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    device_id: String,
    mode: OutputMode,
    base_topic: String,
    quality: DeliveryQuality,
}

impl PayloadBuilder {
    /// Create a builder for `device_id`.
    ///
    /// `base_topic` is only used in discrete mode and defaults to
    /// `mailbox/{device_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] when `device_id` is empty.
    pub fn new(
        device_id: impl Into<String>,
        mode: OutputMode,
        base_topic: Option<String>,
        quality: DeliveryQuality,
    ) -> Result<Self, ValidationError> {
        let device_id = device_id.into();
        if device_id.is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        check_topic_value("device_id", &device_id)?;
        let base_topic = match base_topic.filter(|topic| !topic.is_empty()) {
            Some(topic) => {
                check_topic_value("base_topic", &topic)?;
                topic.trim_end_matches('/').to_string()
            }
            None => format!("mailbox/{device_id}"),
        };
        Ok(Self {
            device_id,
            mode,
            base_topic,
            quality,
        })
    }

    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Topic used by combined mode.
    #[must_use]
    pub fn combined_topic(&self) -> String {
        format!("mailbox/{}/sensors", self.device_id)
    }

    /// Prefix used by discrete mode.
    #[must_use]
    pub fn base_topic(&self) -> &str {
        &self.base_topic
    }

    /// Assemble the payload for one tick.
    #[must_use]
    pub fn build(
        &self,
        state: &MailboxState,
        sample: &SensorSample,
        transition: StateTransitionResult,
        cfg: &ThresholdConfig,
        now: Timestamp,
    ) -> OutboundPayload {
        match self.mode {
            OutputMode::Combined => OutboundPayload::Combined(SensorRecord {
                device_id: self.device_id.clone(),
                timestamp: now,
                proximity_mm: sample.proximity,
                lux: sample.lux,
                has_mail: state.has_mail,
                is_open: state.is_open,
                state_changed: transition.any_changed(),
                last_mail_detected: state.last_mail_detected_at,
                last_opened: state.last_opened_at,
                thresholds: ThresholdEcho {
                    proximity_mail_threshold_mm: cfg.proximity_mail_threshold,
                    lux_open_threshold: cfg.lux_open_threshold,
                },
            }),
            OutputMode::Discrete => OutboundPayload::Discrete(DiscreteReport {
                lux: sample.lux,
                proximity: sample.proximity,
                door: DoorStatus::from_open(state.is_open),
                mail: MailStatus::from_has_mail(state.has_mail),
                heartbeat: now,
            }),
        }
    }

    /// Render a payload into the messages to publish, in publish order.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the combined record cannot be
    /// encoded.
    pub fn render(
        &self,
        payload: &OutboundPayload,
    ) -> Result<Vec<OutboundMessage>, serde_json::Error> {
        match payload {
            OutboundPayload::Combined(record) => Ok(vec![OutboundMessage {
                topic: self.combined_topic(),
                payload: serde_json::to_string(record)?,
                quality: self.quality,
                retain: false,
            }]),
            OutboundPayload::Discrete(report) => {
                let scalars = [
                    ("raw/lux", render_reading(report.lux)),
                    ("raw/proximity", render_reading(report.proximity)),
                    ("status/door", report.door.as_str().to_string()),
                    ("status/mail", report.mail.as_str().to_string()),
                    ("heartbeat", report.heartbeat.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                ];
                Ok(scalars
                    .into_iter()
                    .map(|(suffix, payload)| OutboundMessage {
                        topic: format!("{}/{suffix}", self.base_topic),
                        payload,
                        quality: self.quality,
                        retain: true,
                    })
                    .collect())
            }
        }
    }
}

/// Publish topics may not contain `+`, `#` or NUL.
fn check_topic_value(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains(['+', '#', '\0']) {
        return Err(ValidationError::InvalidTopic {
            name,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn render_reading(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

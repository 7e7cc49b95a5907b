//! Threshold policy — classifies raw readings into mail/open booleans.
//!
//! Proximity hardware differs between mailbox builds: a reflective sensor
//! reports *larger* values when a parcel is close, a ranging sensor reports
//! a *smaller* distance. [`MailComparison`] picks the direction, so both
//! builds share one classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Direction in which a proximity reading must cross the threshold to
/// count as "mail present".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailComparison {
    /// Mail when the reading is strictly above the threshold.
    #[default]
    #[serde(alias = "greater_than")]
    GreaterThan,
    /// Mail when the reading is strictly below the threshold.
    #[serde(alias = "less_than")]
    LessThan,
}

impl MailComparison {
    /// Apply the comparison.
    #[must_use]
    pub fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
        }
    }

    /// Human-readable relation, e.g. for the startup banner.
    #[must_use]
    pub fn relation(self) -> &'static str {
        match self {
            Self::GreaterThan => "above",
            Self::LessThan => "below",
        }
    }
}

impl fmt::Display for MailComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterThan => f.write_str("GREATER_THAN"),
            Self::LessThan => f.write_str("LESS_THAN"),
        }
    }
}

/// Threshold configuration for one mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Proximity value separating "empty" from "mail present".
    pub proximity_mail_threshold: f64,
    /// Lux value above which the door is considered open.
    pub lux_open_threshold: f64,
    /// Readings above this bound are treated as sensor noise.
    pub proximity_valid_max: Option<f64>,
    #[serde(rename = "mail_comparison_direction")]
    pub mail_comparison: MailComparison,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            proximity_mail_threshold: 2000.0,
            lux_open_threshold: 500.0,
            proximity_valid_max: None,
            mail_comparison: MailComparison::GreaterThan,
        }
    }
}

impl ThresholdConfig {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFiniteThreshold`] when a threshold is
    /// NaN or infinite, and [`ValidationError::InvalidValidMax`] when the
    /// validity bound is set but not a finite positive number.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.proximity_mail_threshold.is_finite() {
            return Err(ValidationError::NonFiniteThreshold {
                name: "proximity_mail_threshold",
            });
        }
        if !self.lux_open_threshold.is_finite() {
            return Err(ValidationError::NonFiniteThreshold {
                name: "lux_open_threshold",
            });
        }
        if let Some(max) = self.proximity_valid_max
            && (!max.is_finite() || max <= 0.0)
        {
            return Err(ValidationError::InvalidValidMax(max));
        }
        Ok(())
    }

    /// Whether a proximity reading is usable at all.
    #[must_use]
    pub fn is_valid_proximity(&self, proximity: f64) -> bool {
        proximity.is_finite() && self.proximity_valid_max.is_none_or(|max| proximity <= max)
    }
}

/// Classify a proximity reading as "mail present" or not.
///
/// Returns `None` when the reading is absent or fails the validity bound,
/// so that noise never flips the mailbox state.
#[must_use]
pub fn classify_mail(proximity: Option<f64>, cfg: &ThresholdConfig) -> Option<bool> {
    let value = proximity.filter(|&p| cfg.is_valid_proximity(p))?;
    Some(cfg.mail_comparison.matches(value, cfg.proximity_mail_threshold))
}

/// Classify a lux reading as "door open" or not.
///
/// Returns `None` when the reading is absent or not a finite number.
#[must_use]
pub fn classify_open(lux: Option<f64>, cfg: &ThresholdConfig) -> Option<bool> {
    let value = lux.filter(|l| l.is_finite())?;
    Some(value > cfg.lux_open_threshold)
}

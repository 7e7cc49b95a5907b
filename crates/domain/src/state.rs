//! Mailbox state machine — debounces classified readings into edges.
//!
//! The mailbox holds two independent booleans because door light and parcel
//! proximity are observed by different sensors and may change on the same
//! tick. A boolean only moves when its classifier produces a value that
//! differs from the current one; there is no time-based reset.

use serde::{Deserialize, Serialize};

use crate::sample::SensorSample;
use crate::threshold::{ThresholdConfig, classify_mail, classify_open};
use crate::time::Timestamp;

/// Current debounced state of the mailbox.
///
/// `last_mail_detected_at` and `last_opened_at` record the most recent
/// rising edge of their boolean. Falling edges leave them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MailboxState {
    pub has_mail: bool,
    pub is_open: bool,
    pub last_mail_detected_at: Option<Timestamp>,
    pub last_opened_at: Option<Timestamp>,
}

/// What changed during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateTransitionResult {
    pub mail_changed: bool,
    pub open_changed: bool,
}

impl StateTransitionResult {
    /// Whether either boolean changed.
    #[must_use]
    pub fn any_changed(self) -> bool {
        self.mail_changed || self.open_changed
    }
}

/// Owner of the process-lifetime [`MailboxState`].
#[derive(Debug, Default)]
pub struct MailboxStateMachine {
    state: MailboxState,
}

impl MailboxStateMachine {
    /// Start with no mail, door closed and no recorded edges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the current state.
    #[must_use]
    pub fn state(&self) -> &MailboxState {
        &self.state
    }

    /// Feed one sample through the classifiers and apply any edges.
    ///
    /// Absent or invalid readings skip their check and never flip state.
    pub fn evaluate(
        &mut self,
        sample: &SensorSample,
        cfg: &ThresholdConfig,
        now: Timestamp,
    ) -> StateTransitionResult {
        let mail_changed = apply_edge(
            &mut self.state.has_mail,
            &mut self.state.last_mail_detected_at,
            classify_mail(sample.proximity, cfg),
            now,
        );
        let open_changed = apply_edge(
            &mut self.state.is_open,
            &mut self.state.last_opened_at,
            classify_open(sample.lux, cfg),
            now,
        );

        StateTransitionResult {
            mail_changed,
            open_changed,
        }
    }
}

fn apply_edge(
    current: &mut bool,
    last_rise: &mut Option<Timestamp>,
    classified: Option<bool>,
    now: Timestamp,
) -> bool {
    match classified {
        Some(value) if value != *current => {
            *current = value;
            if value {
                *last_rise = Some(now);
            }
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::threshold::MailComparison;

    fn cfg() -> ThresholdConfig {
        ThresholdConfig {
            proximity_mail_threshold: 100.0,
            lux_open_threshold: 500.0,
            proximity_valid_max: None,
            mail_comparison: MailComparison::LessThan,
        }
    }

    fn t(secs: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn sample(proximity: Option<f64>, lux: Option<f64>, at: Timestamp) -> SensorSample {
        SensorSample::new(proximity, lux, at)
    }

    #[test]
    fn should_start_empty_and_closed() {
        let machine = MailboxStateMachine::new();
        assert_eq!(*machine.state(), MailboxState::default());
        assert!(!machine.state().has_mail);
        assert!(!machine.state().is_open);
        assert!(machine.state().last_mail_detected_at.is_none());
        assert!(machine.state().last_opened_at.is_none());
    }

    #[test]
    fn should_run_reference_scenario() {
        let cfg = cfg();
        let mut machine = MailboxStateMachine::new();

        let first = machine.evaluate(&sample(Some(50.0), Some(600.0), t(0)), &cfg, t(0));
        assert!(first.mail_changed);
        assert!(first.open_changed);
        assert!(first.any_changed());
        assert!(machine.state().has_mail);
        assert!(machine.state().is_open);
        assert_eq!(machine.state().last_mail_detected_at, Some(t(0)));
        assert_eq!(machine.state().last_opened_at, Some(t(0)));

        let second = machine.evaluate(&sample(Some(50.0), Some(600.0), t(2)), &cfg, t(2));
        assert!(!second.any_changed());

        let third = machine.evaluate(&sample(Some(150.0), Some(600.0), t(4)), &cfg, t(4));
        assert!(third.mail_changed);
        assert!(!third.open_changed);
        assert!(!machine.state().has_mail);
        assert!(machine.state().is_open);
        assert_eq!(machine.state().last_mail_detected_at, Some(t(0)));
        assert_eq!(machine.state().last_opened_at, Some(t(0)));
    }

    #[test]
    fn should_be_idempotent_for_repeated_sample() {
        let cfg = cfg();
        let mut machine = MailboxStateMachine::new();
        let s = sample(Some(20.0), Some(10.0), t(0));

        machine.evaluate(&s, &cfg, t(0));
        let before = *machine.state();
        let result = machine.evaluate(&s, &cfg, t(2));

        assert_eq!(result, StateTransitionResult::default());
        assert_eq!(*machine.state(), before);
    }

    #[test]
    fn should_not_flip_state_on_absent_readings() {
        let cfg = cfg();
        let mut machine = MailboxStateMachine::new();
        machine.evaluate(&sample(Some(50.0), Some(600.0), t(0)), &cfg, t(0));

        let result = machine.evaluate(&sample(None, None, t(2)), &cfg, t(2));

        assert!(!result.any_changed());
        assert!(machine.state().has_mail);
        assert!(machine.state().is_open);
    }

    #[test]
    fn should_ignore_proximity_beyond_valid_max() {
        let cfg = ThresholdConfig {
            proximity_valid_max: Some(1000.0),
            mail_comparison: MailComparison::GreaterThan,
            proximity_mail_threshold: 500.0,
            ..cfg()
        };
        let mut machine = MailboxStateMachine::new();

        let result = machine.evaluate(&sample(Some(4000.0), None, t(0)), &cfg, t(0));

        assert!(!result.mail_changed);
        assert!(!machine.state().has_mail);
    }

    #[test]
    fn should_keep_rise_timestamp_on_falling_edge() {
        let cfg = cfg();
        let mut machine = MailboxStateMachine::new();
        machine.evaluate(&sample(None, Some(800.0), t(0)), &cfg, t(0));

        let result = machine.evaluate(&sample(None, Some(3.0), t(2)), &cfg, t(2));

        assert!(result.open_changed);
        assert!(!machine.state().is_open);
        assert_eq!(machine.state().last_opened_at, Some(t(0)));
    }

    #[test]
    fn should_move_rise_timestamp_on_each_new_rising_edge() {
        let cfg = cfg();
        let mut machine = MailboxStateMachine::new();
        machine.evaluate(&sample(Some(10.0), None, t(0)), &cfg, t(0));
        machine.evaluate(&sample(Some(300.0), None, t(2)), &cfg, t(2));
        machine.evaluate(&sample(Some(10.0), None, t(4)), &cfg, t(4));

        assert_eq!(machine.state().last_mail_detected_at, Some(t(4)));
    }

    #[test]
    fn should_only_change_when_classifier_differs_over_sequence() {
        let cfg = cfg();
        let mut machine = MailboxStateMachine::new();
        let readings = [
            (Some(50.0), Some(600.0)),
            (None, Some(600.0)),
            (Some(150.0), None),
            (Some(f64::NAN), Some(f64::NAN)),
            (Some(150.0), Some(10.0)),
            (Some(20.0), Some(10.0)),
            (None, None),
            (Some(20.0), Some(900.0)),
        ];

        for (i, (proximity, lux)) in readings.into_iter().enumerate() {
            let now = t(i64::try_from(i).unwrap() * 2);
            let before = *machine.state();
            let result = machine.evaluate(&sample(proximity, lux, now), &cfg, now);
            let after = *machine.state();

            let expected_mail = classify_mail(proximity, &cfg).unwrap_or(before.has_mail);
            let expected_open = classify_open(lux, &cfg).unwrap_or(before.is_open);
            assert_eq!(after.has_mail, expected_mail);
            assert_eq!(after.is_open, expected_open);
            assert_eq!(result.mail_changed, before.has_mail != after.has_mail);
            assert_eq!(result.open_changed, before.is_open != after.is_open);

            let mail_rose = !before.has_mail && after.has_mail;
            let open_rose = !before.is_open && after.is_open;
            if mail_rose {
                assert_eq!(after.last_mail_detected_at, Some(now));
            } else {
                assert_eq!(after.last_mail_detected_at, before.last_mail_detected_at);
            }
            if open_rose {
                assert_eq!(after.last_opened_at, Some(now));
            } else {
                assert_eq!(after.last_opened_at, before.last_opened_at);
            }
        }
    }
}

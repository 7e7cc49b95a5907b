//! Poll loop — the single sequential driver of the mailbox pipeline.
//!
//! Each tick runs, strictly in order:
//!
//! 1. read both sensors (a failed read becomes an absent value)
//! 2. evaluate the sample against the thresholds
//! 3. build and render the outbound payload
//! 4. publish every rendered message (a failed publish is logged and skipped)
//!
//! then sleeps for the configured interval. The loop owns the
//! [`MailboxStateMachine`], so no synchronization is needed.

use std::future::Future;
use std::time::Duration;

use mailbox_domain::error::{PublishError, SensorError};
use mailbox_domain::payload::PayloadBuilder;
use mailbox_domain::sample::SensorSample;
use mailbox_domain::state::{MailboxState, MailboxStateMachine, StateTransitionResult};
use mailbox_domain::threshold::ThresholdConfig;
use mailbox_domain::time::now;

use crate::ports::{Publisher, SensorReader};

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy)]
pub struct TickReport {
    pub sample: SensorSample,
    pub transition: StateTransitionResult,
    /// Messages accepted by the publisher.
    pub published: usize,
    /// Messages the publisher rejected, or that could not be rendered.
    pub failed: usize,
}

/// Drives sample → evaluate → build → publish on a fixed cadence.
pub struct PollLoop<R, P> {
    reader: R,
    publisher: P,
    machine: MailboxStateMachine,
    thresholds: ThresholdConfig,
    payloads: PayloadBuilder,
    interval: Duration,
}

impl<R: SensorReader, P: Publisher> PollLoop<R, P> {
    /// Create a loop with a fresh state machine (no mail, door closed).
    pub fn new(
        reader: R,
        publisher: P,
        thresholds: ThresholdConfig,
        payloads: PayloadBuilder,
        interval: Duration,
    ) -> Self {
        Self {
            reader,
            publisher,
            machine: MailboxStateMachine::new(),
            thresholds,
            payloads,
            interval,
        }
    }

    /// Current debounced mailbox state.
    pub fn state(&self) -> &MailboxState {
        self.machine.state()
    }

    /// Read both sensors, degrading each failure to an absent value.
    pub async fn sample(&mut self) -> SensorSample {
        let proximity = absent_on_error(self.reader.read_proximity().await);
        let lux = absent_on_error(self.reader.read_lux().await);
        SensorSample::new(proximity, lux, now())
    }

    /// Run one full iteration of the pipeline.
    pub async fn tick(&mut self) -> TickReport {
        let sample = self.sample().await;
        let at = sample.sampled_at;

        let transition = self.machine.evaluate(&sample, &self.thresholds, at);
        self.log_transition(&sample, transition);

        let payload = self.payloads.build(
            self.machine.state(),
            &sample,
            transition,
            &self.thresholds,
            at,
        );

        let mut published = 0;
        let mut failed = 0;
        match self.payloads.render(&payload) {
            Ok(messages) => {
                for message in messages {
                    let topic = message.topic.clone();
                    match self.publisher.publish(message).await {
                        Ok(()) => {
                            tracing::debug!(%topic, "message published");
                            published += 1;
                        }
                        Err(err) => {
                            tracing::warn!(
                                %topic,
                                error = %err,
                                cause = ?std::error::Error::source(&err),
                                "publish failed, will retry next tick"
                            );
                            failed += 1;
                        }
                    }
                }
            }
            Err(err) => {
                let err = PublishError::from(err);
                tracing::warn!(error = %err, "failed to render payload, skipping tick");
                failed += 1;
            }
        }

        let state = self.machine.state();
        tracing::info!(
            has_mail = state.has_mail,
            is_open = state.is_open,
            state_changed = transition.any_changed(),
            "Mail: {}, Open: {}",
            yes_no(state.has_mail),
            yes_no(state.is_open)
        );

        TickReport {
            sample,
            transition,
            published,
            failed,
        }
    }

    /// Tick, sleep, repeat until `shutdown` resolves, then disconnect the
    /// publisher.
    ///
    /// `shutdown` is checked before every tick and during every sleep; an
    /// in-flight tick is abandoned when it fires. The disconnect runs on
    /// every exit path of this method.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        let mut shutdown = std::pin::pin!(shutdown);

        tracing::info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            mode = %self.payloads.mode(),
            "poll loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _report = self.tick() => {}
            }
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("stopping mailbox monitor");
        match self.publisher.disconnect().await {
            Ok(()) => tracing::info!("disconnected from broker"),
            Err(err) => tracing::warn!(error = %err, "disconnect failed"),
        }
    }

    fn log_transition(&self, sample: &SensorSample, transition: StateTransitionResult) {
        let state = self.machine.state();
        if transition.mail_changed {
            if state.has_mail {
                tracing::info!(proximity = ?sample.proximity, "mail detected");
            } else {
                tracing::info!(proximity = ?sample.proximity, "mail removed or taken");
            }
        }
        if transition.open_changed {
            if state.is_open {
                tracing::info!(lux = ?sample.lux, "mailbox opened");
            } else {
                tracing::info!(lux = ?sample.lux, "mailbox closed");
            }
        }
    }
}

fn absent_on_error(reading: Result<f64, SensorError>) -> Option<f64> {
    match reading {
        Ok(value) => {
            tracing::debug!(value, "sensor read");
            Some(value)
        }
        Err(err) => {
            tracing::warn!(
                sensor = %err.sensor(),
                error = %err,
                cause = ?std::error::Error::source(&err),
                "sensor read failed, treating value as absent"
            );
            None
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "YES" } else { "NO" }
}

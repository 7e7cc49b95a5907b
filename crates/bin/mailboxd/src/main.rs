//! # mailboxd — smart mailbox telemetry daemon
//!
//! Composition root that wires the sensor and publisher adapters into the
//! poll loop.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize tracing
//! - Connect the MQTT publisher (fatal on failure)
//! - Construct the sensor reader and the poll loop
//! - Run until SIGINT/SIGTERM, then disconnect
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::process::ExitCode;

use mailbox_adapter_mqtt::MqttPublisher;
use mailbox_adapter_virtual::VirtualSensorReader;
use mailbox_app::poll_loop::PollLoop;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("mailboxd: {}", error_chain(&err));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging.filter);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %error_chain(err.as_ref()), "mailboxd stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("mailboxd: invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let thresholds = config.thresholds;
    let payloads = config.payload_builder()?;

    tracing::info!(
        device_id = %config.device.device_id,
        broker = %config.mqtt.broker(),
        mode = %config.output.output_mode,
        proximity_mail_threshold = thresholds.proximity_mail_threshold,
        mail_when = thresholds.mail_comparison.relation(),
        comparison = %thresholds.mail_comparison,
        lux_open_threshold = thresholds.lux_open_threshold,
        proximity_valid_max = ?thresholds.proximity_valid_max,
        "starting mailbox monitor"
    );

    // Publisher
    let publisher = MqttPublisher::connect(&config.mqtt, config.client_id()).await?;
    tracing::info!(broker = %config.mqtt.broker(), "connected to MQTT broker");

    // Sensors
    let interval = config.poll_interval();
    let reader = VirtualSensorReader::new(config.virtual_sensor);

    let mut poll_loop = PollLoop::new(reader, publisher, thresholds, payloads, interval);
    poll_loop.run(shutdown_signal()).await;

    Ok(())
}

/// Resolve on the first SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

/// Render an error and its sources as `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

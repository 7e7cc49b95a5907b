//! # mailbox-adapter-mqtt
//!
//! MQTT adapter — implements the [`Publisher`](mailbox_app::ports::Publisher)
//! port on top of `rumqttc`.
//!
//! ## How it works
//!
//! [`MqttPublisher::connect`] performs the CONNECT/CONNACK handshake in the
//! foreground so an unreachable broker is reported at startup. It then moves
//! the rumqttc event loop into a background task that owns all network IO,
//! logs acknowledgements and unexpected disconnections, and lets rumqttc
//! reconnect. Publishing only enqueues a request for that task and never
//! waits on the network.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `mailbox-app` and `mailbox-domain`.

mod config;
mod error;
mod publisher;

pub use config::MqttConfig;
pub use error::MqttError;
pub use publisher::MqttPublisher;

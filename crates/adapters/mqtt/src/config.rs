//! MQTT publisher configuration.

use serde::Deserialize;

/// Configuration for the MQTT publisher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_address: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier. Falls back to the device id when unset.
    pub client_id: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long to wait for the broker's CONNACK at startup, in seconds.
    pub connect_timeout_secs: u16,
    /// Pause between reconnect attempts after the connection drops, in seconds.
    pub reconnect_delay_secs: u16,
    /// Capacity of the outgoing request queue between publisher and event loop.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_address: "test.mosquitto.org".to_string(),
            broker_port: 1883,
            client_id: None,
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
            reconnect_delay_secs: 5,
            request_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Return the `host:port` broker address.
    #[must_use]
    pub fn broker(&self) -> String {
        format!("{}:{}", self.broker_address, self.broker_port)
    }
}

//! rumqttc-backed publisher.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::task::JoinHandle;

use mailbox_app::ports::Publisher;
use mailbox_domain::error::PublishError;
use mailbox_domain::payload::{DeliveryQuality, OutboundMessage};

use crate::config::MqttConfig;
use crate::error::MqttError;

/// How long [`MqttPublisher::disconnect`] waits for the event loop to flush.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Publishes outbound messages to an MQTT broker.
pub struct MqttPublisher {
    client: AsyncClient,
    event_loop: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl MqttPublisher {
    /// Connect to the broker and start the background event loop.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Connection`] when the broker is unreachable or
    /// refuses the connection, and [`MqttError::ConnectTimeout`] when it
    /// does not answer within `connect_timeout_secs`.
    pub async fn connect(config: &MqttConfig, client_id: &str) -> Result<Self, MqttError> {
        let mut options = MqttOptions::new(
            client_id,
            config.broker_address.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

        let (client, mut event_loop) = AsyncClient::new(options, config.request_capacity.max(1));

        tracing::info!(broker = %config.broker(), client_id, "connecting to MQTT broker");
        let timeout = Duration::from_secs(u64::from(config.connect_timeout_secs));
        tokio::time::timeout(timeout, wait_for_connack(&mut event_loop))
            .await
            .map_err(|_| MqttError::ConnectTimeout {
                secs: config.connect_timeout_secs,
            })??;

        let reconnect_delay = Duration::from_secs(u64::from(config.reconnect_delay_secs));
        let handle = tokio::spawn(drive(event_loop, reconnect_delay));

        Ok(Self::from_parts(client, Some(handle)))
    }

    fn from_parts(client: AsyncClient, event_loop: Option<JoinHandle<()>>) -> Self {
        Self {
            client,
            event_loop: Mutex::new(event_loop),
            closed: AtomicBool::new(false),
        }
    }

    fn take_event_loop(&self) -> Option<JoinHandle<()>> {
        self.event_loop
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

impl Publisher for MqttPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<(), PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::NotConnected);
        }
        self.client
            .try_publish(
                message.topic.as_str(),
                qos(message.quality),
                message.retain,
                message.payload,
            )
            .map_err(|err| MqttError::Client(err).into_publish(message.topic))
    }

    async fn disconnect(&self) -> Result<(), PublishError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // The request queue is full while the broker is unreachable, so the
        // DISCONNECT must not wait for room in it.
        let result = self.client.try_disconnect().map_err(MqttError::Client);

        if let Some(mut handle) = self.take_event_loop() {
            if result.is_err() {
                tracing::warn!("MQTT request queue full, aborting event loop");
                handle.abort();
            } else if tokio::time::timeout(FLUSH_TIMEOUT, &mut handle).await.is_err() {
                tracing::warn!("MQTT event loop did not stop in time, aborting");
                handle.abort();
            } else {
                tracing::debug!("MQTT event loop stopped");
            }
        }

        result.map_err(PublishError::from)
    }
}

/// Map a delivery quality onto the MQTT `QoS` level.
fn qos(quality: DeliveryQuality) -> QoS {
    match quality {
        DeliveryQuality::AtMostOnce => QoS::AtMostOnce,
        DeliveryQuality::AtLeastOnce => QoS::AtLeastOnce,
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<(), MqttError> {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "connection established");
                return Ok(());
            }
            Ok(event) => tracing::trace!(?event, "MQTT event before CONNACK"),
            Err(err) => return Err(MqttError::Connection(err)),
        }
    }
}

/// Background task: drives network IO until a DISCONNECT has been sent.
///
/// Errors are connection drops; the next `poll` makes rumqttc reconnect.
async fn drive(mut event_loop: EventLoop, reconnect_delay: Duration) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                tracing::debug!(pkid = ack.pkid, "publish acknowledged");
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "reconnected to MQTT broker");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("MQTT disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    retry_in_secs = reconnect_delay.as_secs(),
                    "unexpected MQTT disconnection"
                );
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(topic: &str) -> OutboundMessage {
        OutboundMessage {
            topic: topic.to_string(),
            payload: "{}".to_string(),
            quality: DeliveryQuality::AtLeastOnce,
            retain: false,
        }
    }

    #[test]
    fn should_map_delivery_quality_to_qos() {
        assert_eq!(qos(DeliveryQuality::AtMostOnce), QoS::AtMostOnce);
        assert_eq!(qos(DeliveryQuality::AtLeastOnce), QoS::AtLeastOnce);
    }

    #[tokio::test]
    async fn should_queue_publish_without_network() {
        let options = MqttOptions::new("test", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(options, 4);
        let publisher = MqttPublisher::from_parts(client, None);

        let result = publisher.publish(message("mailbox/m1/sensors")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_reject_publish_when_request_queue_is_full() {
        let options = MqttOptions::new("test", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(options, 1);
        let publisher = MqttPublisher::from_parts(client, None);

        publisher.publish(message("a")).await.unwrap();
        let result = publisher.publish(message("b")).await;

        assert!(matches!(
            result,
            Err(PublishError::Rejected { ref topic, .. }) if topic == "b"
        ));
    }

    #[tokio::test]
    async fn should_refuse_publish_after_disconnect() {
        let options = MqttOptions::new("test", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(options, 4);
        let publisher = MqttPublisher::from_parts(client, None);

        publisher.disconnect().await.unwrap();
        let result = publisher.publish(message("mailbox/m1/sensors")).await;

        assert!(matches!(result, Err(PublishError::NotConnected)));
    }

    #[tokio::test]
    async fn should_not_hang_on_disconnect_when_request_queue_is_full() {
        let options = MqttOptions::new("test", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(options, 2);
        let idle = tokio::spawn(std::future::pending::<()>());
        let publisher = MqttPublisher::from_parts(client, Some(idle));

        publisher.publish(message("a")).await.unwrap();
        publisher.publish(message("b")).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), publisher.disconnect()).await;

        assert!(matches!(result, Ok(Err(PublishError::Transport(_)))));
        assert!(publisher.take_event_loop().is_none());
        assert!(matches!(
            publisher.publish(message("c")).await,
            Err(PublishError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn should_disconnect_only_once() {
        let options = MqttOptions::new("test", "localhost", 1883);
        let (client, _event_loop) = AsyncClient::new(options, 4);
        let publisher = MqttPublisher::from_parts(client, None);

        assert!(publisher.disconnect().await.is_ok());
        assert!(publisher.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn should_fail_to_connect_to_unreachable_broker() {
        let config = MqttConfig {
            broker_address: "127.0.0.1".to_string(),
            broker_port: 1,
            connect_timeout_secs: 2,
            ..MqttConfig::default()
        };

        let result = MqttPublisher::connect(&config, "test").await;

        assert!(matches!(
            result,
            Err(MqttError::Connection(_) | MqttError::ConnectTimeout { .. })
        ));
    }
}

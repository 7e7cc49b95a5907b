//! MQTT adapter error types.

use mailbox_domain::error::PublishError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The broker could not be reached or refused the connection.
    #[error("failed to connect to MQTT broker")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The broker did not answer the CONNECT in time.
    #[error("timed out after {secs}s waiting for MQTT broker")]
    ConnectTimeout { secs: u16 },

    /// The rumqttc client could not queue a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl MqttError {
    /// Convert into a [`PublishError`] for a failed publish on `topic`.
    #[must_use]
    pub fn into_publish(self, topic: impl Into<String>) -> PublishError {
        PublishError::Rejected {
            topic: topic.into(),
            source: Box::new(self),
        }
    }
}

impl From<MqttError> for PublishError {
    fn from(err: MqttError) -> Self {
        PublishError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_connect_timeout_error() {
        let err = MqttError::ConnectTimeout { secs: 10 };
        assert_eq!(
            err.to_string(),
            "timed out after 10s waiting for MQTT broker"
        );
    }

    #[test]
    fn should_convert_into_rejected_publish_error() {
        let err = MqttError::ConnectTimeout { secs: 1 }.into_publish("mailbox/m1/sensors");
        assert!(matches!(
            err,
            PublishError::Rejected { ref topic, .. } if topic == "mailbox/m1/sensors"
        ));
    }

    #[test]
    fn should_convert_into_transport_publish_error() {
        let err: PublishError = MqttError::ConnectTimeout { secs: 1 }.into();
        assert!(matches!(err, PublishError::Transport(_)));
    }
}

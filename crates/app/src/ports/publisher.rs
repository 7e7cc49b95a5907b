//! Publisher port — hands rendered messages to the broker.

use std::future::Future;

use mailbox_domain::error::PublishError;
use mailbox_domain::payload::OutboundMessage;

/// Sends messages to a broker.
///
/// Connection management (handshake, keep-alive, reconnect) is entirely the
/// implementation's concern. A failed call is reported and never retried by
/// the caller within the same tick.
pub trait Publisher {
    /// Publish one message with its topic, delivery quality and retain flag.
    fn publish(
        &self,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// Flush and close the connection. Called once when the poll loop stops.
    fn disconnect(&self) -> impl Future<Output = Result<(), PublishError>> + Send;
}

impl<T: Publisher + Send + Sync> Publisher for std::sync::Arc<T> {
    fn publish(
        &self,
        message: OutboundMessage,
    ) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).publish(message)
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), PublishError>> + Send {
        (**self).disconnect()
    }
}

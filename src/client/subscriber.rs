//! Subscriber representation
//!
//! A `Subscriber` is the registry entry for one live stream. The broker's
//! fan-out path is the only writer of its queue and the owning stream
//! session is the only reader.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::broker::message::ClientId;

/// Identifies one registration of a client id. A client id can be registered
/// again after it is released, and each registration gets a fresh value.
pub type ConnectionId = u64;

/// Sending half of a subscriber's queue of serialized messages.
pub type DeliverySender = mpsc::Sender<String>;

/// Receiving half, owned by the stream session.
pub type DeliveryReceiver = mpsc::Receiver<String>;

/// Create a bounded delivery queue. A zero capacity is bumped to one.
pub fn delivery_channel(capacity: usize) -> (DeliverySender, DeliveryReceiver) {
    mpsc::channel(capacity.max(1))
}

#[derive(Debug)]
pub struct Subscriber {
    /// Client identifier, unique within the registry.
    pub id: ClientId,

    /// Registration this entry belongs to.
    pub connection: ConnectionId,

    /// When the registration was made.
    pub connected_at: DateTime<Utc>,

    sender: DeliverySender,
}

impl Subscriber {
    pub fn new(id: ClientId, connection: ConnectionId, sender: DeliverySender) -> Self {
        Self {
            id,
            connection,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Queue a serialized message without waiting.
    pub fn deliver(&self, data: String) -> Result<(), TrySendError<String>> {
        self.sender.try_send(data)
    }

    /// True once the session side of the queue has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn connected_for(&self) -> chrono::Duration {
        Utc::now() - self.connected_at
    }
}

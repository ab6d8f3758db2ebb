use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::broker::Broker;
use crate::broker::message::{ClientId, InitEnvelope};
use crate::client::{ConnectionId, DeliveryReceiver, delivery_channel};
use crate::session::state::SessionPhase;
use crate::utils::error::SessionError;

/// Name of an event on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Init,
    Published,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::Published => "published",
        }
    }
}

/// One event ready to be written to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub kind: EventKind,
    /// Serialized JSON body.
    pub data: String,
}

impl SessionEvent {
    pub fn init(data: String) -> Self {
        Self {
            kind: EventKind::Init,
            data,
        }
    }

    pub fn published(data: String) -> Self {
        Self {
            kind: EventKind::Published,
            data,
        }
    }

    /// Text framing: event line, data line, blank line.
    pub fn frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.kind.as_str(), self.data)
    }
}

/// Protocol driver for one streaming connection.
///
/// Dropping the session releases its registration, so a connection that
/// disappears mid-stream never leaves a registry entry behind.
#[derive(Debug)]
pub struct StreamSession {
    client_id: ClientId,
    connection: ConnectionId,
    phase: SessionPhase,
    broker: Arc<Broker>,
    receiver: DeliveryReceiver,
    shutdown: CancellationToken,
}

impl StreamSession {
    /// Register `client_id` and build the `init` event.
    ///
    /// `buffer` bounds the delivery queue. `shutdown` ends the session when
    /// the server stops.
    pub fn open(
        broker: Arc<Broker>,
        client_id: ClientId,
        buffer: usize,
        shutdown: CancellationToken,
    ) -> Result<(Self, SessionEvent), SessionError> {
        let (sender, receiver) = delivery_channel(buffer);
        let registration = broker.subscribe(client_id.clone(), sender)?;

        let mut session = Self {
            client_id: client_id.clone(),
            connection: registration.connection,
            phase: SessionPhase::Connecting,
            broker,
            receiver,
            shutdown,
        };

        // From here on an early return drops `session`, which releases it.
        let envelope = InitEnvelope {
            client_id,
            history: registration.history,
        };
        let data = serde_json::to_string(&envelope)?;

        session.phase = SessionPhase::Streaming;
        Ok((session, SessionEvent::init(data)))
    }

    /// Wait for the next `published` event.
    ///
    /// Returns `None` once the session is closed: on server shutdown, or when
    /// the broker drops the delivery queue (unsubscribe or slow-consumer
    /// eviction) and everything already queued has been yielded.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Streaming {
            return None;
        }

        tokio::select! {
            biased;

            _ = self.shutdown.cancelled() => {
                debug!(client_id = %self.client_id, "server shutting down, closing stream");
                self.close();
                None
            }
            received = self.receiver.recv() => match received {
                Some(data) => Some(SessionEvent::published(data)),
                None => {
                    debug!(client_id = %self.client_id, "delivery queue closed");
                    self.close();
                    None
                }
            },
        }
    }

    /// Move to `Closed` and release the registration. Idempotent.
    pub fn close(&mut self) {
        if self.phase.is_closed() {
            return;
        }
        self.phase = SessionPhase::Closed;
        self.receiver.close();

        if let Err(e) = self.broker.release(&self.client_id, self.connection) {
            // Already removed by unsubscribe or eviction.
            debug!(client_id = %self.client_id, connection = self.connection, "{e}");
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

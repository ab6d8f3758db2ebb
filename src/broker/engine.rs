//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - the registry mapping each client id to its delivery queue
//! - the bounded history replayed to newly connected clients
//! - serializing published messages and fanning them out to every subscriber
//!
//! Concurrency and usage notes:
//! - Registry and history sit behind a single lock, so subscribe, unsubscribe,
//!   `is_connected`, `recent` and the fan-out loop of `publish` never observe
//!   each other half-done. The broker is shared as `Arc<Broker>`.
//! - Fan-out uses `try_send` and never waits while the lock is held. A full
//!   queue is handled by the configured `SlowConsumerPolicy`.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::broker::history::{DEFAULT_HISTORY_CAPACITY, HistoryRing};
use crate::broker::message::{ClientId, Message};
use crate::client::{ConnectionId, DeliverySender, Subscriber};
use crate::utils::error::BrokerError;

/// What to do with a subscriber whose queue is full at publish time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlowConsumerPolicy {
    /// Remove the subscriber; its stream ends after draining what is queued.
    #[default]
    Disconnect,
    /// Skip this message for that subscriber only.
    Drop,
}

/// Result of a successful subscribe: the registration handle and the history
/// as it stood at the moment of registration.
#[derive(Debug)]
pub struct Registration {
    pub connection: ConnectionId,
    pub history: Vec<Message>,
}

#[derive(Debug)]
struct Registry {
    subscribers: HashMap<ClientId, Subscriber>,
    history: HistoryRing,
    next_connection: ConnectionId,
}

#[derive(Debug)]
pub struct Broker {
    state: Mutex<Registry>,
    policy: SlowConsumerPolicy,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, SlowConsumerPolicy::default())
    }
}

impl Broker {
    pub fn new(history_capacity: usize, policy: SlowConsumerPolicy) -> Self {
        Self {
            state: Mutex::new(Registry {
                subscribers: HashMap::new(),
                history: HistoryRing::new(history_capacity),
                next_connection: 0,
            }),
            policy,
        }
    }

    /// True iff `client_id` currently has a registration.
    pub fn is_connected(&self, client_id: &str) -> bool {
        self.state.lock().subscribers.contains_key(client_id)
    }

    /// Register `client_id` with its delivery queue.
    ///
    /// The returned history snapshot is taken under the same lock as the
    /// insertion, so every message published afterwards reaches the queue and
    /// nothing published before is missing from the snapshot.
    pub fn subscribe(
        &self,
        client_id: ClientId,
        sender: DeliverySender,
    ) -> Result<Registration, BrokerError> {
        let mut state = self.state.lock();

        if state.subscribers.contains_key(&client_id) {
            return Err(BrokerError::AlreadySubscribed(client_id));
        }

        state.next_connection += 1;
        let connection = state.next_connection;
        let history = state.history.snapshot();

        state.subscribers.insert(
            client_id.clone(),
            Subscriber::new(client_id.clone(), connection, sender),
        );

        info!(client_id = %client_id, connection, "client connected");

        Ok(Registration {
            connection,
            history,
        })
    }

    /// Remove `client_id` and drop its queue sender, closing the queue.
    pub fn unsubscribe(&self, client_id: &str) -> Result<(), BrokerError> {
        let mut state = self.state.lock();

        match state.subscribers.remove(client_id) {
            Some(subscriber) => {
                info!(
                    client_id = %client_id,
                    connection = subscriber.connection,
                    connected_secs = subscriber.connected_for().num_seconds(),
                    "client disconnected"
                );
                Ok(())
            }
            None => Err(BrokerError::NotSubscribed(client_id.to_string())),
        }
    }

    /// Remove `client_id` only if its registration is still `connection`.
    ///
    /// Used by stream sessions, which may have been evicted already and must
    /// not remove a newer registration of the same client id.
    pub fn release(&self, client_id: &str, connection: ConnectionId) -> Result<(), BrokerError> {
        let mut state = self.state.lock();

        let owned = state
            .subscribers
            .get(client_id)
            .is_some_and(|subscriber| subscriber.connection == connection);
        if !owned {
            return Err(BrokerError::NotSubscribed(client_id.to_string()));
        }

        if let Some(subscriber) = state.subscribers.remove(client_id) {
            info!(
                client_id = %client_id,
                connection,
                connected_secs = subscriber.connected_for().num_seconds(),
                "client disconnected"
            );
        }
        Ok(())
    }

    /// Record `msg` in history and deliver its JSON form to every subscriber.
    ///
    /// Returns the number of subscribers the message was queued for. If
    /// encoding fails nothing is delivered.
    pub fn publish(&self, msg: Message) -> Result<usize, BrokerError> {
        let mut state = self.state.lock();

        let encoded = serde_json::to_string(&msg);
        let message_id = msg.id.clone();
        state.history.push(msg);

        let text = match encoded {
            Ok(json) => json,
            Err(e) => {
                error!(message_id = %message_id, "failed to serialize message: {e}");
                return Err(BrokerError::Serialization(e));
            }
        };

        let mut delivered = 0;
        let mut evicted = Vec::new();

        for subscriber in state.subscribers.values() {
            match subscriber.deliver(text.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => match self.policy {
                    SlowConsumerPolicy::Disconnect => {
                        warn!(client_id = %subscriber.id, "delivery queue full, disconnecting");
                        evicted.push(subscriber.id.clone());
                    }
                    SlowConsumerPolicy::Drop => {
                        warn!(
                            client_id = %subscriber.id,
                            message_id = %message_id,
                            "delivery queue full, dropping message"
                        );
                    }
                },
                Err(TrySendError::Closed(_)) => {
                    debug!(client_id = %subscriber.id, "delivery queue closed, skipping");
                }
            }
        }

        for client_id in evicted {
            state.subscribers.remove(&client_id);
        }

        debug!(message_id = %message_id, delivered, "message published");

        Ok(delivered)
    }

    /// Snapshot of recent messages, oldest first.
    pub fn recent(&self) -> Vec<Message> {
        self.state.lock().history.snapshot()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    pub fn policy(&self) -> SlowConsumerPolicy {
        self.policy
    }
}

//! Message definitions for the broker
//!
//! `Message` is the wire/internal representation of a client submission.
//! The JSON field names (`clientId`, `id`, `ts`, `payload`) are the contract
//! browsers publish with and receive in `published` events.
//!
//! Notes on fields:
//! - `client_id`: opaque identity of the sender
//! - `id`: chosen by the sender, expected unique per sender; not enforced
//! - `timestamp`: sender wall-clock; never reconciled with server time
//! - `payload`: caller-defined body (typically JSON text), never inspected

use serde::{Deserialize, Serialize};

/// Opaque client identifier carried in the `clientId` cookie.
pub type ClientId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "clientId")]
    pub client_id: ClientId,
    pub id: String,
    #[serde(rename = "ts")]
    pub timestamp: u64,
    pub payload: String,
}

/// Body of the `init` event sent once when a stream opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitEnvelope {
    #[serde(rename = "clientId")]
    pub client_id: ClientId,
    pub history: Vec<Message>,
}

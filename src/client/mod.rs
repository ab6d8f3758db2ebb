//! The `client` module defines how a connected client is represented inside
//! the broker registry.
//!
//! It provides the `Subscriber` struct, which pairs a client identifier with
//! the bounded queue the broker fans serialized messages into, and the
//! `delivery_channel` constructor for that queue.

pub mod subscriber;
pub use subscriber::{
    ConnectionId, DeliveryReceiver, DeliverySender, Subscriber, delivery_channel,
};

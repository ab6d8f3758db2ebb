//! # popsub-sse
//!
//! `popsub_sse` is a minimal, in-memory publish/subscribe hub that fans
//! client-submitted messages out to every connected browser over
//! server-sent events, replaying a short window of recent messages to
//! clients as they join.
//!
//! ## Core Modules
//!
//! - `broker`: the subscriber registry, the bounded message history and the
//!   publish fan-out, all behind one lock.
//! - `client`: the registry entry for a connected client and its bounded
//!   delivery queue.
//! - `session`: the per-connection protocol driver (`init`, then `published`
//!   events, then an exactly-once release).
//! - `identity`: client id generation and the `clientId` cookie.
//! - `transport`: the axum router with the subscribe and publish endpoints.
//! - `config`: loading server configuration.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod identity;
pub mod session;
pub mod transport;
pub mod utils;

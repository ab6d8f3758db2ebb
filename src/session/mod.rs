//! The `session` module drives the per-connection server-sent events protocol.
//!
//! A `StreamSession` registers with the broker, produces one `init` event
//! with the client id and recent history, then yields a `published` event for
//! every message fanned out to it until the connection goes away. Whatever
//! ends the session, its registration is released exactly once.

pub mod state;
pub mod stream;

pub use state::SessionPhase;
pub use stream::{EventKind, SessionEvent, StreamSession};

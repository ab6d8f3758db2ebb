//! Session state machine
//!
//! Tracks a stream session from registration to teardown.

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Registered with the broker, `init` not produced yet
    Connecting,
    /// `init` produced, relaying published messages
    Streaming,
    /// Registration released; terminal
    Closed,
}

impl SessionPhase {
    pub fn is_closed(&self) -> bool {
        matches!(self, SessionPhase::Closed)
    }
}

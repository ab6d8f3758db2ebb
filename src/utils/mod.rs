//! The `utils` module provides shared building blocks used across the
//! `popsub_sse` crate: the error types each layer returns and the tracing
//! initialisation used by the binary and by tests.

pub mod error;
pub mod logging;

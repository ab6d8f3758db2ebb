//! The `transport` module exposes the broker over HTTP.
//!
//! - `GET /events/subscribe` opens a server-sent events stream (`sse`)
//! - `POST /events/publish` submits one message (`publish`)
//! - everything else falls through to the optional static asset directory
//!
//! `http` holds the shared `AppState`, the router and the serve loop.

pub mod http;
pub mod publish;
pub mod sse;

pub use http::{AppState, create_router, serve};

#[cfg(test)]
mod tests;

//! The `identity` module resolves who a request comes from.
//!
//! Identity is a bare opaque token carried in the `clientId` cookie. When a
//! subscriber arrives without one, an `IdGenerator` mints a fresh id that is
//! handed back through `Set-Cookie`. There is no signature or expiry.

pub mod cookie;
pub mod generator;

pub use cookie::{CLIENT_ID_COOKIE, client_id_from_headers, set_cookie_value};
pub use generator::{CLIENT_ID_ALPHABET, CLIENT_ID_LEN, IdGenerator, RandomIdGenerator};

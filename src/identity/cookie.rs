//! Reading and issuing the `clientId` cookie.

use axum::http::header::{COOKIE, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};

use crate::broker::message::ClientId;

pub const CLIENT_ID_COOKIE: &str = "clientId";

/// Extract the client id from any `Cookie` header on the request.
///
/// A cookie with an empty value is treated as absent.
pub fn client_id_from_headers(headers: &HeaderMap) -> Option<ClientId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CLIENT_ID_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value handing `client_id` back to the browser.
pub fn set_cookie_value(client_id: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{CLIENT_ID_COOKIE}={client_id}; Path=/"))
}

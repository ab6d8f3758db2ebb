//! Publish endpoint
//!
//! The only authorization is that the `clientId` cookie names a currently
//! connected client. The body's own `clientId` is not compared against it.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, warn};

use crate::broker::message::Message;
use crate::identity::client_id_from_headers;
use crate::transport::http::AppState;
use crate::utils::error::{ApiError, ApiResult};

pub async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<StatusCode> {
    let Some(client_id) =
        client_id_from_headers(&headers).filter(|id| state.broker.is_connected(id))
    else {
        warn!("publish from unknown client rejected");
        return Err(ApiError::Unauthorized);
    };

    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| {
            warn!(client_id = %client_id, "failed to read publish body: {e}");
            ApiError::BadRequest(format!("failed to read body: {e}"))
        })?;

    let msg: Message = serde_json::from_slice(&bytes).map_err(|e| {
        warn!(client_id = %client_id, "failed to decode message: {e}");
        ApiError::BadRequest(format!("invalid message: {e}"))
    })?;

    debug!(client_id = %client_id, message_id = %msg.id, "publishing message");
    state.broker.publish(msg)?;

    Ok(StatusCode::OK)
}

//! Subscribe endpoint
//!
//! Resolves the caller's client id (issuing one through `Set-Cookie` when the
//! request has none), opens a `StreamSession` and streams its events. The
//! session lives inside the response body, so when the client disconnects
//! the body is dropped and the registration is released with it.

use std::convert::Infallible;

use async_stream::stream;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::identity::{client_id_from_headers, set_cookie_value};
use crate::session::{SessionEvent, StreamSession};
use crate::transport::http::AppState;
use crate::utils::error::{ApiError, ApiResult};

pub async fn subscribe(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let (client_id, issued_cookie) = match client_id_from_headers(&headers) {
        Some(id) => (id, None),
        None => {
            let id = state.ids.generate();
            let cookie = set_cookie_value(&id).map_err(|e| ApiError::Internal(e.to_string()))?;
            (id, Some(cookie))
        }
    };

    let (mut session, init) = StreamSession::open(
        state.broker.clone(),
        client_id.clone(),
        state.subscriber_buffer,
        state.shutdown.child_token(),
    )
    .map_err(|e| {
        warn!(client_id = %client_id, "failed to open stream: {e}");
        ApiError::from(e)
    })?;

    debug!(client_id = %client_id, "stream opened");

    let events = stream! {
        yield Ok::<Event, Infallible>(to_sse_event(init));
        while let Some(event) = session.next_event().await {
            yield Ok(to_sse_event(event));
        }
    };

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::new().interval(state.keep_alive))
        .into_response();

    let response_headers = response.headers_mut();
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    if let Some(cookie) = issued_cookie {
        response_headers.insert(SET_COOKIE, cookie);
    }

    Ok(response)
}

fn to_sse_event(event: SessionEvent) -> Event {
    Event::default().event(event.kind.as_str()).data(event.data)
}

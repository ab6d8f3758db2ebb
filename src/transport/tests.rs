use super::http::{PUBLISH_PATH, SUBSCRIBE_PATH};
use super::{AppState, create_router};
use crate::broker::Broker;
use crate::config::Settings;
use crate::identity::{CLIENT_ID_LEN, RandomIdGenerator};
use axum::Router;
use axum::body::{Body, BodyDataStream};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    broker: Arc<Broker>,
    shutdown: CancellationToken,
}

fn test_app_with(settings: Settings, static_dir: Option<&str>) -> TestApp {
    let broker = Arc::new(Broker::new(
        settings.broker.history_capacity,
        settings.broker.slow_consumer,
    ));
    let shutdown = CancellationToken::new();
    let state = AppState::new(
        &settings,
        broker.clone(),
        Arc::new(RandomIdGenerator::with_seed(1)),
        shutdown.clone(),
    );
    TestApp {
        router: create_router(state, static_dir),
        broker,
        shutdown,
    }
}

fn test_app() -> TestApp {
    test_app_with(Settings::default(), None)
}

/// Reads `event:`/`data:` blocks off an SSE body, skipping keep-alive comments.
struct EventReader {
    body: BodyDataStream,
    buffer: String,
}

impl EventReader {
    fn new(body: Body) -> Self {
        Self {
            body: body.into_data_stream(),
            buffer: String::new(),
        }
    }

    async fn next_event(&mut self) -> Option<(String, Value)> {
        loop {
            if let Some(pos) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..pos + 2).collect();
                let mut name = None;
                let mut data = None;
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        name = Some(value.trim_start().to_string());
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data = Some(value.trim_start().to_string());
                    }
                }
                if let (Some(name), Some(data)) = (name, data) {
                    return Some((name, serde_json::from_str(&data).unwrap()));
                }
                continue;
            }

            let chunk = timeout(Duration::from_secs(2), self.body.next())
                .await
                .expect("timed out waiting for event")?
                .expect("body error");
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

fn subscribe_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(SUBSCRIBE_PATH);
    if let Some(id) = cookie {
        builder = builder.header(COOKIE, format!("clientId={id}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn publish_request(cookie: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(PUBLISH_PATH)
        .header(CONTENT_TYPE, "application/json");
    if let Some(id) = cookie {
        builder = builder.header(COOKIE, format!("clientId={id}"));
    }
    builder.body(body.into()).unwrap()
}

fn message_json(client_id: &str, id: &str) -> String {
    json!({ "clientId": client_id, "id": id, "ts": 1000, "payload": "hello" }).to_string()
}

#[tokio::test]
async fn test_subscribe_without_cookie_issues_identity() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(subscribe_request(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");

    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    let client_id = cookie
        .strip_prefix("clientId=")
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string();
    assert_eq!(client_id.len(), CLIENT_ID_LEN);

    let mut events = EventReader::new(response.into_body());
    let (name, data) = events.next_event().await.unwrap();
    assert_eq!(name, "init");
    assert_eq!(data["clientId"], client_id);
    assert_eq!(data["history"], json!([]));
    assert!(app.broker.is_connected(&client_id));
}

#[tokio::test]
async fn test_subscribe_with_cookie_reuses_identity() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("known12")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_none());

    let mut events = EventReader::new(response.into_body());
    let (_, data) = events.next_event().await.unwrap();
    assert_eq!(data["clientId"], "known12");
    assert!(app.broker.is_connected("known12"));
}

#[tokio::test]
async fn test_second_stream_for_same_client_conflicts() {
    let app = test_app();
    let first = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("twice01")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("twice01")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert!(app.broker.is_connected("twice01"));
}

#[tokio::test]
async fn test_dropping_stream_unsubscribes() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("leaver1")))
        .await
        .unwrap();
    assert!(app.broker.is_connected("leaver1"));

    drop(response);
    assert!(!app.broker.is_connected("leaver1"));
}

#[tokio::test]
async fn test_subscribe_rejects_other_methods() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri(SUBSCRIBE_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_publish_rejects_other_methods() {
    let app = test_app();
    let request = Request::builder()
        .method("GET")
        .uri(PUBLISH_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_publish_without_cookie_is_unauthorized() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(publish_request(None, message_json("x", "m1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.broker.recent().is_empty());
}

#[tokio::test]
async fn test_publish_from_unknown_client_is_unauthorized() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(publish_request(Some("stranger"), "not even json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.broker.recent().is_empty());
    assert_eq!(app.broker.subscriber_count(), 0);
}

#[tokio::test]
async fn test_publish_malformed_body_is_bad_request() {
    let app = test_app();
    let _stream = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("writer1")))
        .await
        .unwrap();

    for body in ["", "{", r#"{"clientId":"writer1","id":"m1"}"#, r#"{"ts":"soon"}"#] {
        let response = app
            .router
            .clone()
            .oneshot(publish_request(Some("writer1"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
    assert!(app.broker.recent().is_empty());
}

#[tokio::test]
async fn test_publish_oversized_body_is_bad_request() {
    let mut settings = Settings::default();
    settings.server.max_body_bytes = 32;
    let app = test_app_with(settings, None);
    let _stream = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("writer1")))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(publish_request(Some("writer1"), message_json("writer1", "m1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_reaches_subscriber_stream() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("reader1")))
        .await
        .unwrap();
    let mut events = EventReader::new(response.into_body());
    events.next_event().await.unwrap();

    let published = app
        .router
        .clone()
        .oneshot(publish_request(Some("reader1"), message_json("reader1", "m1")))
        .await
        .unwrap();
    assert_eq!(published.status(), StatusCode::OK);

    let (name, data) = events.next_event().await.unwrap();
    assert_eq!(name, "published");
    assert_eq!(data["clientId"], "reader1");
    assert_eq!(data["id"], "m1");
    assert_eq!(data["ts"], 1000);
    assert_eq!(data["payload"], "hello");
    assert_eq!(app.broker.recent().len(), 1);
}

#[tokio::test]
async fn test_shutdown_ends_open_streams() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(subscribe_request(Some("sleeper")))
        .await
        .unwrap();
    let mut events = EventReader::new(response.into_body());
    events.next_event().await.unwrap();

    app.shutdown.cancel();
    assert!(events.next_event().await.is_none());
    assert!(!app.broker.is_connected("sleeper"));
}

#[tokio::test]
async fn test_static_dir_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>demo</h1>").unwrap();
    let app = test_app_with(Settings::default(), dir.path().to_str());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>demo</h1>");
}

#[tokio::test]
async fn test_unknown_path_without_static_dir_is_not_found() {
    let app = test_app();
    let request = Request::builder()
        .uri("/index.html")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

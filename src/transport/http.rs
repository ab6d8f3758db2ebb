use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::broker::Broker;
use crate::config::Settings;
use crate::identity::IdGenerator;
use crate::transport::{publish, sse};

pub const SUBSCRIBE_PATH: &str = "/events/subscribe";
pub const PUBLISH_PATH: &str = "/events/publish";

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub ids: Arc<dyn IdGenerator>,
    /// Cancelled when the server stops; ends every open stream.
    pub shutdown: CancellationToken,
    pub subscriber_buffer: usize,
    pub keep_alive: Duration,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        broker: Arc<Broker>,
        ids: Arc<dyn IdGenerator>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            broker,
            ids,
            shutdown,
            subscriber_buffer: settings.broker.subscriber_buffer,
            keep_alive: Duration::from_secs(settings.server.keep_alive_secs.max(1)),
            max_body_bytes: settings.server.max_body_bytes,
        }
    }
}

/// Build the application router. `static_dir`, when given, is served for
/// every path that is not an event endpoint.
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route(SUBSCRIBE_PATH, get(sse::subscribe))
        .route(PUBLISH_PATH, post(publish::publish))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("SSE broker listening on http://{addr}");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

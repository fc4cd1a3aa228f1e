use std::net::TcpListener;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use super::routes::{convert, fallback, health_check};
use crate::config::Settings;
use crate::error::{Error, Result};

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

// Room for the multipart framing and the non-file fields around the image.
const FORM_OVERHEAD: usize = 64 * 1024;

/// Logs each request and stamps the response with its duration in seconds.
async fn track_process_time<B>(request: Request<B>, next: Next<B>) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    info!("Request: {method} {path}");

    let mut response = next.run(request).await;

    let elapsed = format!("{:.4}", started.elapsed().as_secs_f64());
    let status = response.status();
    if status.is_server_error() {
        error!("Response: {method} {path} - Status: {status} - Processed in: {elapsed}s");
    } else {
        info!("Response: {method} {path} - Status: {status} - Processed in: {elapsed}s");
    }
    if let Ok(value) = HeaderValue::from_str(&elapsed) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}

pub fn create_app(settings: Arc<Settings>) -> Router {
    let body_limit = settings.max_image_size.saturating_add(FORM_OVERHEAD);

    let api = Router::new()
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .fallback(fallback)
        .layer(Extension(settings))
        .layer(middleware::from_fn(track_process_time))
        .layer(cors())
}

/// Any origin, method and header. Credentials are not allowed alongside
/// wildcards, so none are advertised.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Serves the app on an already bound listener until Ctrl+C.
pub async fn serve_listener(listener: TcpListener, settings: Settings) -> Result<()> {
    let addr = listener.local_addr()?;
    let app = create_app(Arc::new(settings));

    let server = axum::Server::from_tcp(listener)
        .map_err(|e| Error::Server(e.to_string()))?
        .serve(app.into_make_service());
    info!("Webserver running on http://{addr}");

    let graceful = server.with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("shutting down");
    });

    graceful.await.map_err(|e| Error::Server(e.to_string()))
}

pub async fn serve(settings: Settings) -> Result<()> {
    let addr = settings.socket_addr()?;
    let listener = TcpListener::bind(addr)?;
    serve_listener(listener, settings).await
}

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::forward::{self, ChatAdapter, ForwardError};
use crate::logger;

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = crate::panic_message(payload.as_ref());
    ForwardError::Transport(message).into_response()
}

/// Router for an already-built adapter.
pub fn router(adapter: Arc<ChatAdapter>) -> Router {
    let chat_path = adapter.settings().chat_path.clone();
    let body_limit = DefaultBodyLimit::max(adapter.settings().max_body_bytes);
    Router::new()
        .route("/health", get(health))
        .route(&chat_path, any(forward::chat).layer(body_limit))
        .with_state(adapter)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        // CORS headers on every response, errors and 405s included
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}

/// The chat path is a literal route: rooted, no `:param` or `*wildcard`
/// captures, and distinct from `/health`.
fn check_chat_path(path: &str) -> AppResult<()> {
    let reason = if !path.starts_with('/') {
        Some("must start with '/'")
    } else if path.contains(':') || path.contains('*') {
        Some("must not contain ':' or '*'")
    } else if path == "/health" {
        Some("conflicts with /health")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(AppError::Config(format!(
            "Invalid chat path '{}': {}",
            path, reason
        ))),
        None => Ok(()),
    }
}

pub fn app(settings: Settings) -> AppResult<Router> {
    check_chat_path(&settings.chat_path)?;
    let client = forward::client::create_client(&settings)?;
    let adapter = ChatAdapter::new(Arc::new(settings), client);
    Ok(router(Arc::new(adapter)))
}

pub async fn serve(settings: Settings) -> AppResult<()> {
    let addr: SocketAddr = settings.listen_addr.parse().map_err(|e| {
        AppError::Config(format!(
            "Invalid listen address '{}': {}",
            settings.listen_addr, e
        ))
    })?;

    if settings.api_key().is_none() {
        logger::warn(
            "server",
            "GEMINI_API_KEY is not set; chat requests will fail until it is configured",
        );
    }
    let chat_path = settings.chat_path.clone();
    let model = settings.model.clone();
    let app = app(settings)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    logger::info(
        "server",
        &format!(
            "Listening on http://{}{} (model={})",
            addr, chat_path, model
        ),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    logger::info("server", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::error("server", &format!("Failed to listen for shutdown signal: {}", e));
        std::future::pending::<()>().await;
    }
    logger::info("server", "Shutdown signal received");
}

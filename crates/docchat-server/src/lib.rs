//! docchat-server
//!
//! HTTP surface of the docchat service: upload a PDF, then chat about
//! it. Route handlers implement the per-request orchestration
//! (validate, resolve context, invoke the model, record the turn);
//! everything stateful lives in [`state::AppState`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Slack for multipart framing on top of the raw file size limit.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::health::health_check))
        .route("/api/upload", post(routes::upload::upload))
        .route("/api/chat", post(routes::chat::chat))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + UPLOAD_OVERHEAD_BYTES,
        ))
        .layer(cors)
        .with_state(state)
}

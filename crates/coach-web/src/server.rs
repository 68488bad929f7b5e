//! Axum server setup and router construction.

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::error::panic_response;

/// Build the full axum router.
///
/// The router serves:
/// - the JSON endpoints (`/analyze`, `/api/analyze`, `/reply`, `/fix`,
///   `/ocr`, `/style`, `/api/products`)
/// - optional static files from `static_dir`, with unknown paths falling
///   back to `index.html`
///
/// When `state` has no static root of its own, `/api/products` reads from
/// `static_dir`.
pub fn build_router(state: AppState, static_dir: Option<PathBuf>, body_limit: usize) -> Router {
    let state = AppState {
        static_dir: state.static_dir.clone().or_else(|| static_dir.clone()),
        ..state
    };

    // The PWA may be opened from another origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/analyze", post(api::post_analyze))
        .route("/api/analyze", post(api::post_analyze))
        .route("/reply", post(api::post_reply))
        .route("/fix", post(api::post_fix))
        .route("/ocr", post(api::post_ocr))
        .route("/style", post(api::post_style))
        .route("/api/products", get(api::get_products))
        .with_state(state);

    if let Some(dir) = static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

//! HTTP front for the reply coach gateway.
//!
//! `coach-web` exposes the [`Gateway`](coach_rs::gateway::Gateway)
//! operations as JSON endpoints and hosts the PWA's static files from a
//! single root directory.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use coach_rs::prelude::*;
//! use coach_web::{AppState, WebConfig, spawn_web};
//!
//! let gateway = Gateway::from_config(&GatewayConfig::from_env()?)?;
//! let state = AppState::new(Arc::new(gateway));
//! let addr = spawn_web(state, WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```
//!
//! # Routes
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /analyze`, `POST /api/analyze` | skin analysis from an image or structured fields |
//! | `POST /reply` | three reply candidates |
//! | `POST /fix` | one lower-risk rewrite |
//! | `POST /ocr` | multipart image → text (stub) |
//! | `POST /style` | writing-style label |
//! | `GET /api/products` | product list JSON from the static root |
//! | anything else | static files, falling back to `index.html` |

mod api;
pub mod error;
mod server;

pub use api::AppState;
pub use error::ApiError;
pub use server::build_router;

use std::net::SocketAddr;
use std::path::PathBuf;

/// JSON bodies may carry a base64 photo.
pub const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3000`.
    pub bind_addr: SocketAddr,
    /// Root directory for static assets. `None` serves only the API.
    pub static_dir: Option<PathBuf>,
    /// Maximum request body size in bytes. Default: 20 MiB.
    pub body_limit: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Bind and serve on a background Tokio task. Returns the bound address.
///
/// The server runs until the Tokio runtime shuts down.
pub async fn spawn_web(state: AppState, config: WebConfig) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;
    let router = build_router(state, config.static_dir, config.body_limit);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Web server error: {e}");
        }
    });

    Ok(addr)
}

/// Bind and serve until `shutdown` resolves.
pub async fn run_web(
    state: AppState,
    config: WebConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    let router = build_router(state, config.static_dir, config.body_limit);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

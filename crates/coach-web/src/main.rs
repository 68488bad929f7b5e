//! Reply coach server.
//!
//! Serves the PWA from a static directory and answers the JSON endpoints by
//! calling an OpenAI-compatible chat completions API.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run -p coach-web
//! OPENAI_API_KEY=sk-... cargo run -p coach-web -- --port 8080 --static-dir ./public
//! RUST_LOG=coach_web=debug,coach_rs=debug OPENAI_API_KEY=sk-... cargo run -p coach-web
//! ```
//!
//! Model settings come from the environment (or a `.env` file), see
//! [`GatewayConfig::from_env`].

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use coach_rs::prelude::*;
use coach_web::{AppState, WebConfig, run_web};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Prompt-response gateway for the reply coach PWA.
#[derive(Parser)]
#[command(about = "Reply coach HTTP server")]
struct Args {
    /// Address to bind to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Directory holding index.html and the other static assets.
    #[arg(long, env = "STATIC_DIR", default_value = ".")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coach_web=info,coach_rs=info,tower_http=info")),
        )
        .with(fmt::layer())
        .init();

    let config = GatewayConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(
        "Using {} (model={}, vision_model={})",
        config.api_url,
        config.model,
        config.vision_model
    );
    let gateway = Gateway::from_config(&config).map_err(|e| e.to_string())?;

    let state = AppState::new(Arc::new(gateway)).with_ocr(Arc::new(NotReadyOcr));
    let web_config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        static_dir: Some(args.static_dir),
        ..Default::default()
    };

    run_web(state, web_config, shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

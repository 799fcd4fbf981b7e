//! Digit recognition server
//!
//! Serves the canvas drawing page and the prediction API. The trained
//! model record is loaded lazily on the first prediction and shared
//! read-only across all requests.

mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::state::{AppState, ServerConfig};

/// Digit recognition server
#[derive(Parser, Debug)]
#[command(name = "mnist-draw-server")]
#[command(version)]
#[command(about = "HTTP server for handwritten digit recognition")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to the trained model record
    #[arg(long, env = "MNIST_DRAW_MODEL")]
    model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let mut config = ServerConfig {
        host: cli.host,
        port: cli.port,
        ..Default::default()
    };
    if let Some(model) = cli.model {
        config.model_path = model;
    }

    info!("digit recognition server v{}", env!("CARGO_PKG_VERSION"));
    info!("model record: {:?}", config.model_path);

    if !config.model_path.exists() {
        warn!(
            "model record {:?} not found; predictions will fail until one is \
            trained with: mnist_draw train",
            config.model_path
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/", get(routes::index::index))
        .route("/health", get(routes::health::health_check))
        .route("/predict", post(routes::predict::predict))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

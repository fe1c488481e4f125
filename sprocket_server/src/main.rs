//! # Sprocket Calculation Service
//!
//! HTTP front for the in-process cost engine.
//!
//! ```text
//! POST /calculate   NormalizedRequest JSON -> { "success": .., "data" | "error": .. }
//! GET  /health
//! ```
//!
//! Calculation failures are reported inside the envelope with status 200;
//! clients read `success` rather than the status code.

use axum::body::Bytes;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use sprocket_core::{costing, logging, NormalizedRequest, ServiceEnvelope};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sprocket-server", version, about = "Sprocket cost calculation service")]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,
}

fn router() -> Router {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn calculate(body: Bytes) -> Json<ServiceEnvelope> {
    let request: NormalizedRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejected calculation request");
            return Json(ServiceEnvelope::failure(e.to_string()));
        }
    };

    let result = costing::calculate(&request);
    match &result {
        Ok(data) => info!(product = %data.product_name, total = data.total_production_cost, "calculated"),
        Err(e) => warn!(error = %e, "calculation failed"),
    }
    Json(result.into())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Bind the listener; `host` may be a hostname such as `localhost`.
async fn bind(args: &Args) -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();
    let listener = bind(&args).await?;
    info!("calculation service listening on {}", listener.local_addr()?);

    axum::serve(listener, router()).await?;
    Ok(())
}

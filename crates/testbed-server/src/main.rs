//! pay-testbed Dashboard Server
//!
//! Axum-based JSON service over the payment harness. The operations backend
//! is selected at startup: by default it shells out to the `pay-testbed`
//! CLI binary and parses its text output; set `TESTBED_BACKEND=direct` to
//! call the payment gateway in-process instead.

mod backend;
mod console;
mod error;
mod handlers;
mod parse;
mod runner;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use testbed_core::Config;
use testbed_gateway::{PaymentGateway, StripeGateway};

use crate::backend::{BackendKind, CliBackend, DirectBackend, OpsBackend};
use crate::console::ConsoleStore;
use crate::handlers::{
    create_payment_action, create_refund_action, dashboard, health_check, payments_view,
    refresh_balance_action,
};
use crate::runner::CliRunner;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("TESTBED_CONFIG").unwrap_or_else(|_| "conf/config.json".into());
    let project_dir = std::env::var("TESTBED_PROJECT_DIR").unwrap_or_else(|_| ".".into());

    let console = Arc::new(ConsoleStore::new());

    // Select the operations backend
    let backend: Arc<dyn OpsBackend> = match BackendKind::from_env() {
        BackendKind::Direct => {
            // Config problems are fatal here; the CLI backend defers them to
            // the subprocess, which reports them per request instead.
            let config = Config::load(&config_path)?;
            let settings = config.payment_settings.clone();
            let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::from_config(&config));
            tracing::info!("✓ Direct gateway backend");
            Arc::new(DirectBackend::new(gateway, settings))
        }
        BackendKind::Cli => {
            tracing::info!(config = %config_path, "✓ CLI subprocess backend");
            let mut runner = CliRunner::new(project_dir.as_str(), config_path.as_str());
            if let Some(secs) = std::env::var("TESTBED_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
            {
                runner = runner.with_timeout(std::time::Duration::from_secs(secs));
            }
            Arc::new(CliBackend::new(runner, console.clone()))
        }
    };

    let state = AppState { backend, console };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/dashboard", get(dashboard))
        .route("/api/payments", get(payments_view))
        .route("/api/actions/create-payment", post(create_payment_action))
        .route("/api/actions/create-refund", post(create_refund_action))
        .route("/api/actions/refresh-balance", post(refresh_balance_action))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("pay-testbed dashboard running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  GET  /api/dashboard               - Balance + spotlight payments");
    tracing::info!("  GET  /api/payments                - Payment list and detail");
    tracing::info!("  POST /api/actions/create-payment  - Create and confirm a payment");
    tracing::info!("  POST /api/actions/create-refund   - Refund a payment");
    tracing::info!("  POST /api/actions/refresh-balance - Re-run the balance check");

    axum::serve(listener, app).await?;

    Ok(())
}

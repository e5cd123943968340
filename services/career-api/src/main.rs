//! CareerPro API
//!
//! HTTP service for the AI Career Pro entitlement and billing backend.
//!
//! ## Endpoints
//!
//! - `GET  /api/v1/entitlements/check` - May this user run this tool now?
//! - `GET  /api/v1/usage/summary` - Monthly remaining per service
//! - `POST /api/v1/usage/consume` - Atomic authorize-and-record
//! - `POST /api/v1/usage/record` - Post-hoc usage append
//! - `DELETE /api/v1/usage` - Account-deletion ledger purge
//! - `GET  /api/v1/billing/subscription` - Subscription state
//! - `POST /api/v1/billing/checkout` - Create checkout session
//! - `POST /api/v1/billing/portal` - Create billing-portal session
//! - `GET  /api/v1/billing/history` - Billing history
//! - `POST /api/v1/achievements/check` - Evaluate achievements after an action
//! - `GET  /api/v1/achievements` - Completed achievements
//! - `POST /api/v1/notifications/send` - Templated, preference-gated email
//! - `POST /webhooks/stripe` - Stripe webhook receiver
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("career_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CareerPro API");

    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // An incomplete limit table is a configuration error; refuse to start
    config.catalog.validate()?;

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let pool = careerpro_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    let state = AppState::new(pool, config.clone());

    let app = build_router(state, metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        // Entitlement and usage routes
        .route("/entitlements/check", get(handlers::check_entitlement))
        .route("/usage/summary", get(handlers::usage_summary))
        .route("/usage/consume", post(handlers::consume_usage))
        .route("/usage/record", post(handlers::record_usage))
        .route("/usage", delete(handlers::purge_usage))
        // Billing routes
        .route("/billing/subscription", get(handlers::get_subscription))
        .route("/billing/checkout", post(handlers::create_checkout))
        .route("/billing/portal", post(handlers::create_portal))
        .route("/billing/history", get(handlers::billing_history))
        // Achievement routes
        .route("/achievements", get(handlers::list_achievements))
        .route("/achievements/check", post(handlers::check_achievements))
        // Notification routes
        .route("/notifications/send", post(handlers::send_notification));

    // Webhook route (separate - uses the raw body, no JSON extractor)
    let webhook_routes = Router::new().route("/webhooks/stripe", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most operations are single queries; the consume path adds one
    // transaction. SLO is <200ms p99.
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("careerpro_operation_duration_seconds".to_string()),
        latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "careerpro_usage_consumed_total",
        "Usage consume attempts by service and result"
    );
    metrics::describe_counter!(
        "careerpro_webhooks_processed_total",
        "Webhook deliveries by status"
    );
    metrics::describe_counter!(
        "careerpro_checkouts_created_total",
        "Checkout sessions created"
    );
    metrics::describe_counter!(
        "careerpro_achievements_unlocked_total",
        "Achievements unlocked by category"
    );
    metrics::describe_histogram!(
        "careerpro_operation_duration_seconds",
        "Operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

//! HTTP API server for the checkout fulfillment engine.
//!
//! Exposes the single order-submission operation plus diagnostics, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::{
    FulfillmentOrchestrator, InMemoryCrmApi, InMemoryCrmStore, InMemoryLedgerStore,
    InMemoryPaymentGateway, InMemoryProductStore, InMemoryShippingService, InMemoryUserStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders/submit", post(routes::orders::submit))
        .route("/payment/locations", get(routes::orders::locations))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state wired to in-memory collaborators.
pub fn create_default_state() -> Arc<AppState> {
    let gateway = InMemoryPaymentGateway::new();
    let users = InMemoryUserStore::new();
    let crm_store = InMemoryCrmStore::new();
    let crm_api = InMemoryCrmApi::new();
    let shipping = InMemoryShippingService::new();
    let products = InMemoryProductStore::new();
    let ledgers = InMemoryLedgerStore::new();

    let orchestrator = FulfillmentOrchestrator::new(
        gateway.clone(),
        users,
        crm_store,
        crm_api,
        shipping.clone(),
        products,
        ledgers,
    );

    Arc::new(AppState {
        orchestrator,
        gateway,
        shipping,
    })
}

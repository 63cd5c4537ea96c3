//! HTTP API server with observability for the booking saga.
//!
//! Exposes the booking lifecycle endpoints (create, slots, reserve,
//! confirm, cancel, reschedule) with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use provider::{InMemorySchedulingProvider, SchedulingProvider};
use saga::{BookingSaga, RetryPolicy};
use store::{BookingStore, InMemoryBookingStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::booking::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P, S>(state: Arc<AppState<P, S>>, metrics_handle: PrometheusHandle) -> Router
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/booking/create", post(routes::booking::create::<P, S>))
        .route("/booking/{id}/slots", get(routes::booking::slots::<P, S>))
        .route(
            "/booking/{id}/slots/reserve",
            post(routes::booking::reserve::<P, S>),
        )
        .route(
            "/booking/{id}/slots/confirm",
            post(routes::booking::confirm::<P, S>),
        )
        .route(
            "/booking/invoices/{id}/cancel",
            put(routes::booking::cancel::<P, S>),
        )
        .route(
            "/booking/reschedule",
            post(routes::booking::reschedule::<P, S>),
        )
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

/// Creates application state around the given provider and store.
pub fn create_state<P, S>(provider: P, store: S, retry: RetryPolicy) -> Arc<AppState<P, S>>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    Arc::new(AppState {
        saga: BookingSaga::new(provider, store, retry),
    })
}

/// Creates fully in-memory application state for tests and local runs.
pub fn create_in_memory_state() -> (
    Arc<AppState<InMemorySchedulingProvider, InMemoryBookingStore>>,
    InMemorySchedulingProvider,
    InMemoryBookingStore,
) {
    let provider = InMemorySchedulingProvider::new();
    let store = InMemoryBookingStore::new();
    let state = create_state(provider.clone(), store.clone(), RetryPolicy::default());
    (state, provider, store)
}

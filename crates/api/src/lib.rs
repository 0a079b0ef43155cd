//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for balances, history and money movement
//! - Translation of ledger errors into HTTP responses
//! - The request tracing span
//! - The exchange-rate provider used for balance conversion

pub mod error;
pub mod middleware;
pub mod rates;
pub mod routes;
pub mod service;

pub use error::ErrorResponder;
pub use rates::FreeCurrencyApi;
pub use service::{MoneyService, MoneyServices};

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger reads and writes.
    pub money: Arc<dyn MoneyService>,
    /// Turns ledger errors into responses.
    pub errors: ErrorResponder,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

impl AppState {
    /// Creates the state with the default error responder.
    pub fn new(money: Arc<dyn MoneyService>, body_limit: usize) -> Self {
        Self {
            money,
            errors: ErrorResponder,
            body_limit,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::api_routes())
        .layer(RequestBodyLimitLayer::new(state.body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

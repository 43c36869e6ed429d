//! # Tally API
//!
//! REST server for the store's credit ledger.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally API Routes                                │
//! │                                                                         │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────────────┐│
//! │  │  Sales                   │  │  Credits                             ││
//! │  │                          │  │                                      ││
//! │  │ • POST /api/sales/credit │  │ • GET  /api/credits                  ││
//! │  │ • GET  /api/sales/:id    │  │ • POST /api/credits                  ││
//! │  └──────────────────────────┘  │ • GET  /api/credits/total-outstanding││
//! │                                │ • GET  /api/credits/:id              ││
//! │  ┌──────────────────────────┐  │ • POST /api/credits/pay/:id          ││
//! │  │  Health                  │  │ • GET  /api/credits/customer/:key    ││
//! │  │ • GET  /api/health       │  │ • POST /api/credits/customer/:key/pay││
//! │  └──────────────────────────┘  └──────────────────────────────────────┘│
//! │                                                                         │
//! │  TraceLayer (span per request) ─► CorsLayer ─► handler ─► tally-db     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]: defaults, `tally.toml`, then `TALLY__*`
//! environment variables (e.g. `TALLY__SERVER__PORT`).

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tally_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the HTTP router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    use handlers::{credits, health, sales};

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/sales/credit", post(sales::create_credit_sale))
        .route("/api/sales/:id", get(sales::get_sale))
        .route(
            "/api/credits",
            get(credits::list_outstanding).post(credits::create_credit),
        )
        .route(
            "/api/credits/total-outstanding",
            get(credits::total_outstanding),
        )
        .route("/api/credits/pay/:id", post(credits::pay_credit))
        .route(
            "/api/credits/customer/:key",
            get(credits::customer_statements),
        )
        .route(
            "/api/credits/customer/:key/pay",
            post(credits::pay_customer),
        )
        .route("/api/credits/:id", get(credits::get_credit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

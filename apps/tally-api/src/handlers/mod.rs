//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: extract, call a repository, serialize. Body and
//! query extractors are taken as `Result` so malformed input becomes an
//! `ApiError` with a `VALIDATION_ERROR` code instead of axum's plain-text
//! rejection.

pub mod credits;
pub mod health;
pub mod sales;

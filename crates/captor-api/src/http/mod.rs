//! HTTP/REST API layer for Captor.
//!
//! Axum-based REST API at `/api/` with bearer token authentication,
//! envelope response format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;

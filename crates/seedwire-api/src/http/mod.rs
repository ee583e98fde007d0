//! HTTP surface modules (router, handlers, WebSocket bridge).

/// Shared constants and header names.
pub mod constants;
/// JSON error responses.
pub mod errors;
/// Health and metrics endpoints.
pub mod health;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
/// Observer WebSocket endpoint.
pub mod ws;

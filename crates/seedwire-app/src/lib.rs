#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Seedwire application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `demo.rs` (simulated worker feed).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Simulated worker lifecycle for trying the relay without an engine.
pub mod demo;
/// Application-level error type.
pub mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};

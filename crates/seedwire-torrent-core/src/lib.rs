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

//! Engine-agnostic torrent worker interfaces consumed by the relay.
//!
//! Layout: `model.rs` (metadata DTOs), `bitfield.rs` (piece completion map),
//! `selection.rs` (file coverage math), `lifecycle.rs` (stage snapshot),
//! `worker.rs` / `registry.rs`
//! (collaborator traits), `memory.rs` (in-process reference engine).

pub mod bitfield;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod model;
pub mod registry;
pub mod selection;
pub mod worker;

pub use bitfield::Bitfield;
pub use error::{TorrentError, TorrentResult};
pub use lifecycle::{LifecyclePhase, LifecycleState};
pub use memory::{MemoryRegistry, MemoryWorker};
pub use model::{SelectionRange, TorrentFile, TorrentMetadata};
pub use registry::{WorkerCreated, WorkerRegistry};
pub use selection::{file_coverage, is_covered, piece_span};
pub use worker::{SwarmControl, TorrentWorker};

#![forbid(unsafe_code)]
//! hmerge-core: shared vocabulary for the streaming merge engine.
//!
//! - `types`: `Scalar`/`Column`/`RowBatch` (a chunk is a `RowBatch`).
//! - `schema`: `DataType`/`Field`/`Schema` plus the numeric vs categorical split.
//! - `config`: `EngineConfig` with env overrides.
//! - `budget`: memory budget traits (implemented in `hmerge-mem`).
//! - `hash` / `manifest`: blake3 digests and the per-run manifest.
//!
//! No file IO lives here.

pub mod budget;
pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};

/// Engine version recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

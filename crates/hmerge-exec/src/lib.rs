#![forbid(unsafe_code)]
//! hmerge-exec: runs a `MergePlan`.
//!
//! One thread, blocking I/O, strict read -> merge -> impute -> write order per
//! chunk. The primary source drives the loop; every other source is pulled for
//! exactly as many rows and wraps around to its first row when it runs out.

pub mod cursor;
pub mod metrics;
pub mod runtime;

pub use cursor::{CursorState, SourceCursor};
pub use metrics::Progress;
pub use runtime::{write_manifest, Engine, ExecError};

//! Convenient re-exports for downstream crates.

pub use crate::config::{ChunkBounds, EngineConfig};
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::manifest::{ManifestId, RunManifest, SourceReport};
pub use crate::schema::{ColumnKind, DataType, Field, Schema};
pub use crate::types::{Column, RowBatch, Scalar};

//! Per-run manifest: what was merged, how, and what came out.
//!
//! Emitted by the engine after a successful run. A failed run produces no
//! manifest; its partial output is left on disk as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

/// Per-source streaming statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub path: String,
    pub prefix: Option<String>,
    pub size_bytes: u64,
    pub primary: bool,
    /// Row count from the pre-pass, if it ran.
    pub counted_rows: Option<u64>,
    /// Rows handed to the merge, including wrapped repeats.
    pub rows_emitted: u64,
    /// Times the reader was restarted to keep pace with the primary.
    pub cycles: u64,
    /// Merged-row offsets at which each restart took effect.
    pub wrap_offsets: Vec<u64>,
    pub rows_skipped: u64,
    pub rows_coerced: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the merge plan (sources, order, chunk size, strategies).
    pub plan_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    pub output_path: String,
    pub chunk_rows: usize,
    pub sources: Vec<SourceReport>,

    pub rows_written: u64,
    pub columns_written: usize,
    pub chunks: u64,
    pub bytes_written: u64,
    pub peak_buffer_bytes: usize,

    /// Digest of the bytes written to the output sink.
    pub output_digest: Option<Hash256>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(plan_hash: Hash256, output_path: impl Into<String>, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            plan_hash,
            engine_version: crate::VERSION.to_string(),
            output_path: output_path.into(),
            chunk_rows: 0,
            sources: Vec::new(),
            rows_written: 0,
            columns_written: 0,
            chunks: 0,
            bytes_written: 0,
            peak_buffer_bytes: 0,
            output_digest: None,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, output_digest: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.output_digest = output_digest;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}

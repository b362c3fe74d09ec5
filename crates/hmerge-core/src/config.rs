//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

/// Row bounds and scaling constants for the per-source chunk size estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub min_rows: usize,
    pub max_rows: usize,
    /// Rows per chunk at the reference size.
    pub base_rows: usize,
    /// Reference file size in GiB; files this size get `base_rows`.
    pub reference_gib: f64,
}

impl Default for ChunkBounds {
    fn default() -> Self {
        Self {
            min_rows: 10_000,
            max_rows: 100_000,
            base_rows: 100_000,
            reference_gib: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap (bytes) on rows held by the output writer's pending buffer.
    pub mem_cap_bytes: usize,

    /// Flush the pending buffer once it holds this many rows.
    pub flush_rows: usize,

    /// Fixed chunk size; when `None` it is derived from the primary source size.
    pub chunk_rows: Option<usize>,

    pub chunk_bounds: ChunkBounds,

    /// Run the row-count pre-pass (progress reporting only).
    pub count_rows: bool,

    /// Emit a progress event every N merged chunks.
    pub progress_every_chunks: usize,

    /// Literal used for categorical columns with nothing to impute from.
    pub unknown_literal: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mem_cap_bytes: 512 * 1024 * 1024, // 512 MiB default
            flush_rows: 1_000_000,
            chunk_rows: None,
            chunk_bounds: ChunkBounds::default(),
            count_rows: true,
            progress_every_chunks: 10,
            unknown_literal: "Unknown".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `HMERGE_MEM_CAP_BYTES`: writer buffer cap in bytes
    /// - `HMERGE_FLUSH_ROWS`: rows buffered before a flush
    /// - `HMERGE_CHUNK_ROWS`: fixed chunk size
    /// - `HMERGE_MIN_CHUNK_ROWS` / `HMERGE_MAX_CHUNK_ROWS`: estimate bounds
    /// - `HMERGE_PROGRESS_EVERY`: chunks between progress events
    /// - `HMERGE_COUNT_ROWS`: `0`/`false` disables the pre-pass
    /// - `HMERGE_UNKNOWN_LITERAL`: categorical fallback value
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_parse::<usize>("HMERGE_MEM_CAP_BYTES") {
            cfg.mem_cap_bytes = v;
        }

        if let Some(v) = env_parse::<usize>("HMERGE_FLUSH_ROWS") {
            cfg.flush_rows = v;
        }

        if let Some(v) = env_parse::<usize>("HMERGE_CHUNK_ROWS") {
            cfg.chunk_rows = Some(v);
        }

        if let Some(v) = env_parse::<usize>("HMERGE_MIN_CHUNK_ROWS") {
            cfg.chunk_bounds.min_rows = v;
        }

        if let Some(v) = env_parse::<usize>("HMERGE_MAX_CHUNK_ROWS") {
            cfg.chunk_bounds.max_rows = v;
        }

        if let Some(v) = env_parse::<usize>("HMERGE_PROGRESS_EVERY") {
            cfg.progress_every_chunks = v;
        }

        if let Ok(s) = std::env::var("HMERGE_COUNT_ROWS") {
            cfg.count_rows = !matches!(s.trim(), "0" | "false" | "no" | "off");
        }

        if let Ok(s) = std::env::var("HMERGE_UNKNOWN_LITERAL") {
            cfg.unknown_literal = s;
        }

        cfg
    }

    /// Reject settings that would break the bounded-memory contract.
    pub fn validate(&self) -> crate::Result<()> {
        let b = &self.chunk_bounds;
        if b.min_rows == 0 || b.min_rows > b.max_rows {
            return Err(crate::Error::Config(format!(
                "chunk bounds must satisfy 0 < min ({}) <= max ({})",
                b.min_rows, b.max_rows
            )));
        }
        if !(b.reference_gib > 0.0) {
            return Err(crate::Error::Config(
                "reference_gib must be positive".into(),
            ));
        }
        if self.chunk_rows == Some(0) {
            return Err(crate::Error::Config("chunk_rows must be positive".into()));
        }
        if self.flush_rows == 0 {
            return Err(crate::Error::Config("flush_rows must be positive".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.flush_rows, 1_000_000);
        assert_eq!(cfg.unknown_literal, "Unknown");
    }

    #[test]
    fn inverted_bounds_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.chunk_bounds.min_rows = 200_000;
        assert!(cfg.validate().is_err());
    }
}

//! Chunk sizing from file size.
//!
//! `rows = base_rows * reference_gib / size_gib`, clamped to the configured
//! bounds: the bigger the file, the smaller the chunk.

use std::path::Path;

use hmerge_core::config::ChunkBounds;

use crate::error::PlanError;

const GIB: f64 = (1u64 << 30) as f64;

/// Size of `path` in bytes. A missing file is a planning error.
pub fn source_size(path: &Path) -> Result<u64, PlanError> {
    match std::fs::metadata(path) {
        Ok(m) if m.is_file() => Ok(m.len()),
        Ok(_) => Err(PlanError::Invalid(format!("{} is not a file", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PlanError::SourceNotFound(path.to_path_buf()))
        }
        Err(source) => Err(PlanError::File {
            context: format!("reading metadata of {}", path.display()),
            source,
        }),
    }
}

pub fn estimate_chunk_rows(size_bytes: u64, bounds: &ChunkBounds) -> usize {
    if size_bytes == 0 {
        return bounds.max_rows;
    }
    let size_gib = size_bytes as f64 / GIB;
    let raw = bounds.base_rows as f64 * (bounds.reference_gib / size_gib);
    if raw >= bounds.max_rows as f64 {
        return bounds.max_rows;
    }
    (raw as usize).clamp(bounds.min_rows, bounds.max_rows)
}

//! Row-count pre-pass.
//!
//! Streams the source projected to its first column and sums chunk lengths.
//! The total feeds progress reporting only.

use std::path::Path;

use crate::error::Result;
use crate::readers::csv::{CsvChunkReader, SourceOptions};

pub fn count_rows(path: impl AsRef<Path>, opts: &SourceOptions, chunk_rows: usize) -> Result<u64> {
    let mut reader = CsvChunkReader::open(path, opts)?
        .with_chunk_rows(chunk_rows)
        .with_projection(vec![0])?;
    let mut total = 0u64;
    while let Some(chunk) = reader.next_chunk()? {
        total += chunk.num_rows() as u64;
    }
    tracing::debug!(path = %reader.path().display(), rows = total, "row count pre-pass done");
    Ok(total)
}

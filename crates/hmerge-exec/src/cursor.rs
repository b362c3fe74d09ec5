//! Per-source read cursor with wrap-around.
//!
//! A non-primary source is asked for exactly `n` rows at a time. When its
//! reader runs dry the cursor restarts it from the first data row and keeps
//! filling, recording the merged-row offset at which each wrap took effect.

use std::path::Path;

use hmerge_core::manifest::SourceReport;
use hmerge_core::types::RowBatch;
use hmerge_io::{CsvChunkReader, PassStats};
use serde::Serialize;

use crate::runtime::ExecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CursorState {
    Streaming,
    /// The reader hit end of input and was restarted; no row has been read
    /// from the new pass yet.
    ExhaustedRestarting,
}

pub struct SourceCursor {
    reader: CsvChunkReader,
    primary: bool,
    state: CursorState,
    cycles: u64,
    wrap_offsets: Vec<u64>,
    rows_emitted: u64,
    /// Stats of finished passes.
    done: PassStats,
}

impl SourceCursor {
    pub fn new(reader: CsvChunkReader, primary: bool) -> Self {
        Self {
            reader,
            primary,
            state: CursorState::Streaming,
            cycles: 0,
            wrap_offsets: Vec::new(),
            rows_emitted: 0,
            done: PassStats::default(),
        }
    }

    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn wrap_offsets(&self) -> &[u64] {
        &self.wrap_offsets
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Next chunk of the primary source; `None` ends the run.
    pub fn pull_primary(&mut self) -> Result<Option<RowBatch>, ExecError> {
        let chunk = self.reader.next_chunk()?;
        if let Some(b) = &chunk {
            self.rows_emitted += b.num_rows() as u64;
        }
        Ok(chunk)
    }

    /// Exactly `n` rows, wrapping as often as needed. `merged_offset` is the
    /// output row the first returned row lands on.
    pub fn pull_exact(&mut self, n: usize, merged_offset: u64) -> Result<RowBatch, ExecError> {
        if n == 0 {
            let schema = self.reader.schema();
            return Ok(RowBatch::empty_like(&schema.names()));
        }
        let mut out = RowBatch::default();
        let mut got = 0usize;
        while got < n {
            match self.reader.next_rows(n - got)? {
                Some(part) => {
                    self.state = CursorState::Streaming;
                    got += part.num_rows();
                    out.append(part)?;
                }
                None => {
                    if self.state == CursorState::ExhaustedRestarting {
                        return Err(ExecError::EmptySource(self.reader.path().to_path_buf()));
                    }
                    self.wrap(merged_offset + got as u64)?;
                }
            }
        }
        self.rows_emitted += got as u64;
        Ok(out)
    }

    fn wrap(&mut self, at: u64) -> Result<(), ExecError> {
        self.absorb_pass();
        self.reader.restart()?;
        self.state = CursorState::ExhaustedRestarting;
        self.cycles += 1;
        self.wrap_offsets.push(at);
        tracing::debug!(
            path = %self.reader.path().display(),
            cycle = self.cycles,
            merged_row = at,
            "source wrapped to first row"
        );
        Ok(())
    }

    fn absorb_pass(&mut self) {
        let s = self.reader.stats();
        self.done.rows_yielded += s.rows_yielded;
        self.done.rows_skipped += s.rows_skipped;
        self.done.rows_coerced += s.rows_coerced;
        self.done.cells_coerced += s.cells_coerced;
    }

    /// True when a source that never wrapped still has rows left, i.e. it is
    /// longer than the primary and its tail was not merged.
    pub fn was_truncated(&mut self) -> Result<bool, ExecError> {
        if self.primary || self.cycles > 0 || self.reader.is_exhausted() {
            return Ok(false);
        }
        Ok(self.reader.next_rows(1)?.is_some())
    }

    pub fn report(&self, size_bytes: u64, prefix: Option<String>, counted_rows: Option<u64>) -> SourceReport {
        let cur = self.reader.stats();
        SourceReport {
            path: self.reader.path().display().to_string(),
            prefix,
            size_bytes,
            primary: self.primary,
            counted_rows,
            rows_emitted: self.rows_emitted,
            cycles: self.cycles,
            wrap_offsets: self.wrap_offsets.clone(),
            rows_skipped: self.done.rows_skipped + cur.rows_skipped,
            rows_coerced: self.done.rows_coerced + cur.rows_coerced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmerge_core::types::Scalar;
    use hmerge_io::SourceOptions;
    use std::path::PathBuf;

    fn source(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hmerge-cursor-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    fn cursor(p: &PathBuf, chunk_rows: usize) -> SourceCursor {
        let opts = SourceOptions {
            delimiter: Some(b','),
            ..SourceOptions::default()
        };
        let r = CsvChunkReader::open(p, &opts).unwrap().with_chunk_rows(chunk_rows);
        SourceCursor::new(r, false)
    }

    #[test]
    fn wraps_to_fill_request() {
        let p = source("three.csv", "v\na\nb\nc\n");
        let mut c = cursor(&p, 4);
        let b = c.pull_exact(4, 0).unwrap();
        assert_eq!(
            b.columns[0].values,
            vec![
                Scalar::Str("a".into()),
                Scalar::Str("b".into()),
                Scalar::Str("c".into()),
                Scalar::Str("a".into())
            ]
        );
        assert_eq!(c.cycles(), 1);
        assert_eq!(c.wrap_offsets(), &[3]);
        assert_eq!(c.state(), CursorState::Streaming);
    }

    #[test]
    fn empty_source_cannot_wrap() {
        let p = source("empty.csv", "v\n");
        let mut c = cursor(&p, 4);
        assert!(matches!(c.pull_exact(2, 0), Err(ExecError::EmptySource(_))));
    }

    #[test]
    fn detects_unmerged_tail() {
        let p = source("long.csv", "v\n1\n2\n3\n");
        let mut c = cursor(&p, 4);
        c.pull_exact(2, 0).unwrap();
        assert!(c.was_truncated().unwrap());
    }
}

//! Header-once-then-append CSV sink with a bounded pending buffer.
//!
//! The first batch written sets the header; later batches only append rows.
//! Pushed batches wait in a pending buffer that holds a budget guard for its
//! bytes. The buffer is flushed when it reaches `flush_rows` rows or when the
//! budget refuses to cover the next batch.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use csv as csv_crate;
use hmerge_core::budget::{BudgetGuard, MemoryBudget};
use hmerge_core::hash::{Hash256, StreamDigest};
use hmerge_core::types::{RowBatch, Scalar};
use hmerge_mem::{BudgetGuardImpl, MemoryBudgetImpl, PeakTracker};
use serde::Serialize;

use crate::error::{Error, Result};

/// Floats with no fractional part below this magnitude print as `N.0`.
const INTEGRAL_FLOAT_LIMIT: f64 = 1e16;

/// What the sink wrote over its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct SinkSummary {
    pub rows_written: u64,
    pub chunks_written: u64,
    pub bytes_written: u64,
    pub digest: Hash256,
    pub peak_buffer_bytes: usize,
}

/// Passes bytes through to `inner`, hashing them on the way.
pub struct DigestWriter<W: Write> {
    inner: W,
    digest: StreamDigest,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            digest: StreamDigest::new(),
        }
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct PendingBuffer {
    batch: RowBatch,
    guard: Option<BudgetGuardImpl>,
    budget: MemoryBudgetImpl,
    peak: PeakTracker,
}

impl PendingBuffer {
    fn rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Account `bytes` more against the budget. `false` leaves the guard as-is.
    fn reserve(&mut self, bytes: usize) -> bool {
        let ok = match self.guard.as_mut() {
            Some(g) => {
                let next = g.bytes() + bytes;
                g.try_resize(next)
            }
            None => match self.budget.try_acquire(bytes, "pending-rows") {
                Some(g) => {
                    self.guard = Some(g);
                    true
                }
                None => false,
            },
        };
        if ok {
            self.peak.record_used(self.held_bytes());
        }
        ok
    }

    fn held_bytes(&self) -> usize {
        self.guard.as_ref().map(|g| g.bytes()).unwrap_or(0)
    }

    /// Hand the buffered rows over and release their budget.
    fn take(&mut self) -> RowBatch {
        self.guard = None;
        std::mem::take(&mut self.batch)
    }
}

pub struct CsvSink<W: Write> {
    wtr: csv_crate::Writer<DigestWriter<W>>,
    header_written: bool,
    pending: PendingBuffer,
    flush_rows: usize,
    rows_written: u64,
    chunks_written: u64,
}

impl CsvSink<File> {
    /// Create (or truncate) `path`.
    pub fn create(
        path: impl AsRef<Path>,
        flush_rows: usize,
        budget: MemoryBudgetImpl,
    ) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::to_writer(file, flush_rows, budget))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn to_writer(writer: W, flush_rows: usize, budget: MemoryBudgetImpl) -> Self {
        Self {
            wtr: csv_crate::Writer::from_writer(DigestWriter::new(writer)),
            header_written: false,
            pending: PendingBuffer {
                batch: RowBatch::default(),
                guard: None,
                budget,
                peak: PeakTracker::new(),
            },
            flush_rows: flush_rows.max(1),
            rows_written: 0,
            chunks_written: 0,
        }
    }

    /// Rows currently waiting in the pending buffer.
    pub fn pending_rows(&self) -> usize {
        self.pending.rows()
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Queue a batch for output.
    pub fn push(&mut self, batch: RowBatch) -> Result<()> {
        self.chunks_written += 1;
        let bytes = batch.approx_bytes();

        if !self.pending.reserve(bytes) {
            self.flush()?;
            if !self.pending.reserve(bytes) {
                tracing::debug!(
                    bytes,
                    cap = self.pending.budget.capacity_bytes(),
                    "batch larger than buffer cap, writing through"
                );
                return self.write_batch(&batch);
            }
        }

        self.pending.batch.append(batch)?;
        if self.pending.rows() >= self.flush_rows {
            self.flush()?;
        }
        Ok(())
    }

    /// Write a batch straight to the output, writing the header first if needed.
    /// A zero-row batch writes just the header.
    pub fn write_batch(&mut self, batch: &RowBatch) -> Result<()> {
        if !self.header_written {
            self.wtr.write_record(batch.column_names())?;
            self.header_written = true;
        }
        let mut field = String::new();
        for row in 0..batch.num_rows() {
            for col in &batch.columns {
                field.clear();
                render_into(&col.values[row], &mut field);
                self.wtr.write_field(&field)?;
            }
            self.wtr.write_record(None::<&[u8]>)?;
        }
        self.rows_written += batch.num_rows() as u64;
        Ok(())
    }

    /// Write out everything pending and flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.rows() > 0 || !self.pending.batch.columns.is_empty() {
            let batch = self.pending.take();
            tracing::debug!(rows = batch.num_rows(), "flushing pending rows");
            self.write_batch(&batch)?;
        }
        self.wtr.flush()?;
        Ok(())
    }

    /// Flush, close, and return the inner writer with the run summary.
    pub fn into_inner(mut self) -> Result<(W, SinkSummary)> {
        self.flush()?;
        let peak_buffer_bytes = self.pending.peak.peak();
        let rows_written = self.rows_written;
        let chunks_written = self.chunks_written;
        let mut out = self
            .wtr
            .into_inner()
            .map_err(|e| Error::Io(io::Error::new(e.error().kind(), e.error().to_string())))?;
        out.flush()?;
        let summary = SinkSummary {
            rows_written,
            chunks_written,
            bytes_written: out.digest.bytes(),
            digest: out.digest.finalize(),
            peak_buffer_bytes,
        };
        Ok((out.inner, summary))
    }

    pub fn finish(self) -> Result<SinkSummary> {
        self.into_inner().map(|(_, summary)| summary)
    }
}

/// Text for one output cell.
pub fn render_cell(v: &Scalar) -> String {
    let mut s = String::new();
    render_into(v, &mut s);
    s
}

fn render_into(v: &Scalar, out: &mut String) {
    use std::fmt::Write as _;
    match v {
        Scalar::Null => {}
        Scalar::I64(i) => {
            let _ = write!(out, "{i}");
        }
        Scalar::F64(f) if !f.is_finite() => {}
        Scalar::F64(f) if f.fract() == 0.0 && f.abs() < INTEGRAL_FLOAT_LIMIT => {
            let _ = write!(out, "{f:.1}");
        }
        Scalar::F64(f) => {
            let _ = write!(out, "{f}");
        }
        Scalar::Str(s) => out.push_str(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmerge_core::types::Column;

    fn batch(ids: &[i64], names: &[&str]) -> RowBatch {
        RowBatch::new(vec![
            Column::new("id", ids.iter().map(|i| Scalar::I64(*i)).collect()),
            Column::new(
                "name",
                names.iter().map(|s| Scalar::Str(s.to_string())).collect(),
            ),
        ])
    }

    fn sink(flush_rows: usize, cap: usize) -> CsvSink<Vec<u8>> {
        CsvSink::to_writer(Vec::new(), flush_rows, MemoryBudgetImpl::new(cap))
    }

    #[test]
    fn header_written_once() {
        let mut s = sink(100, 1 << 20);
        s.push(batch(&[1], &["a"])).unwrap();
        s.push(batch(&[2], &["b, c"])).unwrap();
        let (out, summary) = s.into_inner().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,name\n1,a\n2,\"b, c\"\n");
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.chunks_written, 2);
        assert_eq!(summary.bytes_written, 21);
    }

    #[test]
    fn flushes_at_row_threshold() {
        let mut s = sink(2, 1 << 20);
        s.push(batch(&[1], &["a"])).unwrap();
        assert_eq!(s.pending_rows(), 1);
        s.push(batch(&[2], &["b"])).unwrap();
        assert_eq!(s.pending_rows(), 0);
        assert_eq!(s.rows_written(), 2);
    }

    #[test]
    fn tiny_budget_writes_through() {
        let mut s = sink(1_000, 8);
        s.push(batch(&[1, 2], &["a", "b"])).unwrap();
        assert_eq!(s.pending_rows(), 0);
        let summary = s.finish().unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.peak_buffer_bytes, 0);
    }

    #[test]
    fn float_rendering() {
        assert_eq!(render_cell(&Scalar::F64(20.0)), "20.0");
        assert_eq!(render_cell(&Scalar::F64(2.5)), "2.5");
        assert_eq!(render_cell(&Scalar::F64(-0.125)), "-0.125");
        assert_eq!(render_cell(&Scalar::I64(20)), "20");
        assert_eq!(render_cell(&Scalar::Null), "");
    }

    #[test]
    fn empty_batch_writes_header_only() {
        let mut s = sink(10, 1 << 20);
        s.write_batch(&RowBatch::empty_like(&["a", "b"])).unwrap();
        let (out, _) = s.into_inner().unwrap();
        assert_eq!(out, b"a,b\n");
    }
}

//! Runtime: drive a `MergePlan` chunk by chunk and emit a `RunManifest`.
//!
//! Per iteration:
//! 1. pull one chunk (n rows) from the primary
//! 2. pull exactly n rows from every other source, wrapping as needed
//! 3. concatenate side by side
//! 4. impute
//! 5. hand to the sink
//!
//! The run stops when the primary is exhausted. Any I/O error aborts the run
//! and leaves the partial output in place.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use hmerge_core::config::EngineConfig;
use hmerge_core::manifest::RunManifest;
use hmerge_core::types::RowBatch;
use hmerge_impute::{ImputeError, ImputeStats, Imputer, MissingProfile};
use hmerge_io::{count_rows, CsvSink};
use hmerge_mem::MemoryBudgetImpl;
use hmerge_planner::{MergePlan, PlanError};

use crate::cursor::SourceCursor;
use crate::metrics::Progress;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Io(#[from] hmerge_io::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("imputation: {0}")]
    Impute(#[from] ImputeError),

    #[error(transparent)]
    Core(#[from] hmerge_core::Error),

    #[error("source {} has no data rows and cannot be wrapped to match the primary", .0.display())]
    EmptySource(PathBuf),

    #[error("invalid plan: {0}")]
    Invalid(String),

    #[error("manifest: {0}")]
    Manifest(String),
}

/// Owns the writer's memory budget and runtime settings.
pub struct Engine {
    cfg: EngineConfig,
    budget: MemoryBudgetImpl,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        let cap = cfg.mem_cap_bytes;
        Self {
            cfg,
            budget: MemoryBudgetImpl::new(cap),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Execute `plan` and return its manifest.
    pub fn run(&self, plan: &MergePlan) -> Result<RunManifest, ExecError> {
        if plan.sources.is_empty() || !plan.sources[0].primary {
            return Err(ExecError::Invalid("first source must be the primary".into()));
        }
        let started_ms = now_millis();
        let clock = Instant::now();
        let chunk_rows = plan.chunk_rows;

        let plan_hash = plan.plan_hash()?;
        let mut manifest = RunManifest::new(plan_hash, plan.output.display().to_string(), started_ms);
        manifest.chunk_rows = chunk_rows;

        let counted = self.count_sources(plan)?;

        let mut cursors = Vec::with_capacity(plan.sources.len());
        for sp in &plan.sources {
            cursors.push(SourceCursor::new(sp.open(chunk_rows)?, sp.primary));
        }

        let imputer = Imputer::new(plan.impute.clone());
        let mut sink = CsvSink::create(&plan.output, self.cfg.flush_rows, self.budget.clone())?;
        let mut progress = Progress::new(counted[0], self.cfg.progress_every_chunks);
        let mut filled = ImputeStats::default();
        let mut offset = 0u64;
        let mut chunks = 0u64;

        tracing::info!(
            output = %plan.output.display(),
            sources = plan.sources.len(),
            columns = plan.schema.len(),
            chunk_rows,
            "merge started"
        );

        let (primary, others) = cursors.split_at_mut(1);
        while let Some(head) = primary[0].pull_primary()? {
            let n = head.num_rows();
            let mut parts = Vec::with_capacity(others.len() + 1);
            parts.push(head);
            for c in others.iter_mut() {
                parts.push(c.pull_exact(n, offset)?);
            }
            let mut merged = RowBatch::concat(parts)?;

            if chunks == 0 {
                MissingProfile::of(&merged).log();
            }
            let st = imputer.impute(&mut merged, offset)?;
            filled.add(&st);
            tracing::debug!(chunk = chunks, rows = n, cells_filled = st.cells_filled, "chunk merged");

            sink.push(merged)?;
            offset += n as u64;
            chunks += 1;
            progress.record(n);
        }

        if chunks == 0 {
            tracing::warn!(path = %plan.primary().path.display(), "primary source has no data rows, writing header only");
            sink.write_batch(&RowBatch::empty_like(&plan.schema.names()))?;
        }

        for c in others.iter_mut() {
            if c.was_truncated()? {
                tracing::warn!(
                    path = %c.path().display(),
                    rows_merged = offset,
                    "a source is longer than the primary; rows past the primary's end were not merged"
                );
            }
        }
        for (c, sp) in cursors.iter().zip(&plan.sources) {
            if c.cycles() > 0 {
                tracing::warn!(
                    path = %sp.path.display(),
                    cycles = c.cycles(),
                    "source is shorter than the primary; its rows were reused from the top"
                );
            }
        }

        let summary = sink.finish()?;
        progress.finish();

        manifest.sources = cursors
            .iter()
            .zip(&plan.sources)
            .zip(&counted)
            .map(|((c, sp), rows)| c.report(sp.size_bytes, sp.prefix.clone(), *rows))
            .collect();
        manifest.rows_written = summary.rows_written;
        manifest.columns_written = plan.schema.len();
        manifest.chunks = chunks;
        manifest.bytes_written = summary.bytes_written;
        manifest.peak_buffer_bytes = summary.peak_buffer_bytes;
        let manifest = manifest.finish(now_millis(), Some(summary.digest));

        tracing::info!(
            output = %plan.output.display(),
            size_gib = summary.bytes_written as f64 / (1u64 << 30) as f64,
            rows = summary.rows_written,
            columns = manifest.columns_written,
            cells_filled = filled.cells_filled,
            text_columns = filled.text_columns,
            elapsed_ms = clock.elapsed().as_millis() as u64,
            digest = %summary.digest,
            "merge finished"
        );
        Ok(manifest)
    }

    /// Row-count pre-pass, one entry per source in plan order.
    fn count_sources(&self, plan: &MergePlan) -> Result<Vec<Option<u64>>, ExecError> {
        if !self.cfg.count_rows {
            return Ok(vec![None; plan.sources.len()]);
        }
        let mut out = Vec::with_capacity(plan.sources.len());
        for sp in &plan.sources {
            let rows = count_rows(&sp.path, &sp.options(), plan.chunk_rows)?;
            tracing::info!(path = %sp.path.display(), rows, "rows counted");
            out.push(Some(rows));
        }
        Ok(out)
    }
}

/// Write `manifest` as pretty JSON.
pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<(), ExecError> {
    let json = serde_json::to_vec_pretty(manifest).map_err(|e| ExecError::Manifest(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| ExecError::Manifest(format!("writing {}: {e}", path.display())))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

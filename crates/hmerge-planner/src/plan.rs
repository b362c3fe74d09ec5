//! Merge planning.
//!
//! Sources are ordered by file size, largest first (ties keep job order). The
//! largest is the primary: it sets the chunk size and the output row count.
//! Each source is opened once to read its header and first chunk, which fixes
//! its column types. Output columns follow source order.

use std::path::PathBuf;

use hmerge_core::config::EngineConfig;
use hmerge_core::hash::{hash_serde, Hash256};
use hmerge_core::schema::Schema;
use hmerge_impute::{ImputePlan, PolicyTable};
use hmerge_io::buf::DEFAULT_READ_AHEAD;
use hmerge_io::sniff::delimiter_name;
use hmerge_io::{infer_schema, CsvChunkReader, SourceOptions};
use serde::Serialize;

use crate::catalog::{catalog, DatasetKind};
use crate::cost::{estimate_chunk_rows, source_size};
use crate::dsl::yaml::{MergeJob, SourceSpec};
use crate::error::PlanError;

/// Unknown-column warnings list at most this many names.
const UNKNOWN_COLUMN_SAMPLE: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct SourcePlan {
    pub path: PathBuf,
    pub prefix: Option<String>,
    pub dataset: Option<DatasetKind>,
    pub size_bytes: u64,
    pub delimiter: char,
    /// Supplied column names for a headerless source.
    pub columns: Option<Vec<String>>,
    /// Typed output schema, prefixed.
    pub schema: Schema,
    /// Chunk size this source alone would get.
    pub estimated_chunk_rows: usize,
    pub primary: bool,
}

impl SourcePlan {
    pub fn options(&self) -> SourceOptions {
        SourceOptions {
            delimiter: Some(self.delimiter as u8),
            columns: self.columns.clone(),
            buffer_bytes: DEFAULT_READ_AHEAD,
        }
    }

    /// Open a reader positioned at the first data row.
    pub fn open(&self, chunk_rows: usize) -> Result<CsvChunkReader, PlanError> {
        Ok(CsvChunkReader::open(&self.path, &self.options())?
            .with_chunk_rows(chunk_rows)
            .with_schema(self.schema.clone())?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergePlan {
    /// Processing order; the first entry is the primary.
    pub sources: Vec<SourcePlan>,
    pub output: PathBuf,
    pub chunk_rows: usize,
    /// Output schema: every source schema side by side.
    pub schema: Schema,
    pub impute: ImputePlan,
    pub config: EngineConfig,
}

impl MergePlan {
    pub fn primary(&self) -> &SourcePlan {
        &self.sources[0]
    }

    /// Stable hash of what determines the output bytes.
    pub fn plan_hash(&self) -> Result<Hash256, PlanError> {
        Ok(hash_serde(&(
            &self.sources,
            self.chunk_rows,
            &self.schema,
            &self.impute,
        ))?)
    }
}

pub fn plan_merge(job: &MergeJob, cfg: &EngineConfig) -> Result<MergePlan, PlanError> {
    cfg.validate()?;
    if job.sources.is_empty() {
        return Err(PlanError::Invalid("at least one source is required".into()));
    }

    let mut sized: Vec<(&SourceSpec, u64)> = Vec::with_capacity(job.sources.len());
    for spec in &job.sources {
        sized.push((spec, source_size(&spec.path)?));
    }
    // `sort_by` is stable: equal sizes keep job order.
    sized.sort_by(|a, b| b.1.cmp(&a.1));

    let primary_size = sized[0].1;
    let chunk_rows = cfg
        .chunk_rows
        .unwrap_or_else(|| estimate_chunk_rows(primary_size, &cfg.chunk_bounds));

    let mut sources = Vec::with_capacity(sized.len());
    for (i, (spec, size_bytes)) in sized.into_iter().enumerate() {
        let sp = plan_source(spec, size_bytes, chunk_rows, cfg)?;
        tracing::info!(
            path = %sp.path.display(),
            prefix = sp.prefix.as_deref().unwrap_or("-"),
            size_bytes,
            delimiter = delimiter_name(sp.delimiter as u8),
            columns = sp.schema.len(),
            primary = i == 0,
            "source planned"
        );
        sources.push(SourcePlan {
            primary: i == 0,
            ..sp
        });
    }

    let parts: Vec<&Schema> = sources.iter().map(|s| &s.schema).collect();
    let schema = Schema::concat(&parts)?;

    let mut table = if job.builtin_policies {
        PolicyTable::hcup_defaults()
    } else {
        PolicyTable::empty()
    };
    table.merge(&job.policies);
    let impute = ImputePlan::resolve(&schema, &table, cfg.unknown_literal.clone());

    Ok(MergePlan {
        sources,
        output: job.output.clone(),
        chunk_rows,
        schema,
        impute,
        config: cfg.clone(),
    })
}

fn plan_source(
    spec: &SourceSpec,
    size_bytes: u64,
    chunk_rows: usize,
    cfg: &EngineConfig,
) -> Result<SourcePlan, PlanError> {
    let opts = SourceOptions {
        delimiter: spec.delimiter_byte()?,
        columns: spec.columns.clone(),
        buffer_bytes: DEFAULT_READ_AHEAD,
    };
    let mut reader = CsvChunkReader::open(&spec.path, &opts)?.with_chunk_rows(chunk_rows);
    let source_columns = reader.source_columns().to_vec();
    let sample = reader.next_chunk()?.unwrap_or_else(|| {
        let names: Vec<&str> = source_columns.iter().map(String::as_str).collect();
        hmerge_core::types::RowBatch::empty_like(&names)
    });
    if sample.num_rows() == 0 {
        tracing::warn!(path = %spec.path.display(), "source has no data rows");
    }

    if let Some(kind) = spec.dataset {
        check_catalog(spec, kind, &source_columns)?;
    }

    let typed = infer_schema(&sample);
    let prefix = spec.effective_prefix();
    let schema = match &prefix {
        Some(p) => typed.with_prefix(p),
        None => typed,
    };

    Ok(SourcePlan {
        path: spec.path.clone(),
        prefix,
        dataset: spec.dataset,
        size_bytes,
        delimiter: reader.delimiter() as char,
        columns: spec.columns.clone(),
        schema,
        estimated_chunk_rows: estimate_chunk_rows(size_bytes, &cfg.chunk_bounds),
        primary: false,
    })
}

fn check_catalog(spec: &SourceSpec, kind: DatasetKind, columns: &[String]) -> Result<(), PlanError> {
    let Some(layout) = catalog()?.dataset(kind) else {
        tracing::debug!(dataset = %kind, "no column layout for dataset, skipping check");
        return Ok(());
    };
    let unknown = layout.unknown_columns(spec.group.as_deref(), columns)?;
    if !unknown.is_empty() {
        let sample: Vec<&str> = unknown.iter().take(UNKNOWN_COLUMN_SAMPLE).copied().collect();
        tracing::warn!(
            path = %spec.path.display(),
            dataset = %kind,
            count = unknown.len(),
            "columns not in the {} layout: {}",
            kind,
            sample.join(", ")
        );
    }
    Ok(())
}

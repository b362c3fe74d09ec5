#![forbid(unsafe_code)]
//! hmerge: bounded-memory streaming merge and imputation of wide delimited
//! tables.
//!
//! This facade re-exports the member crates and wires planning to execution:
//!
//! - `hmerge-core`: chunks, schemas, config, hashing, manifests
//! - `hmerge-mem`: the writer's memory budget
//! - `hmerge-io`: delimiter sniffing, chunked reader, row counter, CSV sink
//! - `hmerge-impute`: chunk-local imputation policies
//! - `hmerge-planner`: job files, chunk sizing, catalog, merge plans
//! - `hmerge-exec`: the lockstep merge runtime

pub use hmerge_core::config::{ChunkBounds, EngineConfig};
pub use hmerge_core::manifest::{RunManifest, SourceReport};
pub use hmerge_exec::{write_manifest, Engine, ExecError};
pub use hmerge_impute::{CategoricalMethod, DatasetPolicy, NumericMethod, PolicyTable};
pub use hmerge_planner::{load_job, parse_job, plan_merge, MergeJob, MergePlan, SourceSpec};

/// Plan `job` under `cfg` and run it.
pub fn run_job(job: &MergeJob, cfg: EngineConfig) -> Result<RunManifest, ExecError> {
    let plan = plan_merge(job, &cfg)?;
    Engine::new(cfg).run(&plan)
}

/// Serialize a manifest for display or storage.
pub fn manifest_json(manifest: &RunManifest) -> serde_json::Result<String> {
    serde_json::to_string_pretty(manifest)
}

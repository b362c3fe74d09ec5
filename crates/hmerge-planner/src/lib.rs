#![forbid(unsafe_code)]
//! hmerge-planner: from a (YAML) merge job to a resolved `MergePlan`.
//!
//! - `dsl`: the job file format and its config overlay.
//! - `cost`: file size -> chunk size.
//! - `catalog`: embedded HCUP column layouts.
//! - `plan`: source ordering, typing, prefixing, and strategy resolution.
//!
//! Planning opens every source once to read its header and first chunk; it
//! never writes anything.

pub mod catalog;
pub mod cost;
pub mod dsl;
pub mod error;
pub mod plan;

pub use catalog::{catalog, Catalog, CatalogColumn, ColumnGroup, DatasetKind, DatasetLayout};
pub use cost::{estimate_chunk_rows, source_size};
pub use dsl::yaml::{load_job, parse_job, JobConfig, MergeJob, SourceSpec};
pub use error::PlanError;
pub use plan::{plan_merge, MergePlan, SourcePlan};

#![forbid(unsafe_code)]
//! hmerge-impute: fills missing cells of one chunk at a time.
//!
//! Strategies are resolved once per column (`policy`) and then applied to each
//! chunk independently (`Imputer::impute`). Nothing carries over between chunks.

pub mod analyze;
pub mod fill;
pub mod imputer;
pub mod interpolate;
pub mod policy;

pub use analyze::{ColumnMissing, MissingProfile};
pub use imputer::{ImputeError, ImputeStats, Imputer};
pub use policy::{
    column_prefix, CategoricalMethod, ColumnPlan, ColumnStrategy, DatasetPolicy, ImputePlan,
    NumericMethod, PolicyTable,
};

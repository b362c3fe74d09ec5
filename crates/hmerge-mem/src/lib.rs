#![forbid(unsafe_code)]
//! hmerge-mem: hard memory budgeting for buffered rows.
//!
//! Concrete implementations of the traits in `hmerge-core::budget`. The output
//! writer's pending buffer holds a guard sized to the rows it keeps, so the
//! configured cap is never exceeded by buffering.

pub mod guard;
pub mod tracking;

pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};
pub use tracking::PeakTracker;

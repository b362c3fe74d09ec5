use hmerge_core::types::{RowBatch, Scalar};
use serde::Serialize;
use thiserror::Error;

use crate::fill::{fill_forward, fill_mode};
use crate::interpolate::fill_numeric;
use crate::policy::{CategoricalMethod, ColumnStrategy, ImputePlan};

#[derive(Debug, Error)]
pub enum ImputeError {
    #[error("chunk has {got} columns, impute plan expects {expected}")]
    Width { got: usize, expected: usize },

    #[error("chunk column {index} is '{got}', impute plan expects '{expected}'")]
    Column {
        index: usize,
        got: String,
        expected: String,
    },
}

/// Per-chunk fill counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImputeStats {
    pub cells_filled: u64,
    /// Categorical columns filled with the fallback literal.
    pub literal_columns: u64,
    /// Numeric columns with no known value, left missing.
    pub columns_left_missing: u64,
    /// Numeric columns that held text in this chunk and were filled as categorical.
    pub text_columns: u64,
}

impl ImputeStats {
    pub fn add(&mut self, other: &ImputeStats) {
        self.cells_filled += other.cells_filled;
        self.literal_columns += other.literal_columns;
        self.columns_left_missing += other.columns_left_missing;
        self.text_columns += other.text_columns;
    }
}

/// Applies a resolved [`ImputePlan`] to chunks.
#[derive(Debug, Clone)]
pub struct Imputer {
    plan: ImputePlan,
}

impl Imputer {
    pub fn new(plan: ImputePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &ImputePlan {
        &self.plan
    }

    /// Fill the missing cells of `batch` in place. Columns must line up with
    /// the plan. `row_offset` is the chunk's first row in the output.
    pub fn impute(&self, batch: &mut RowBatch, row_offset: u64) -> Result<ImputeStats, ImputeError> {
        if batch.num_columns() != self.plan.columns.len() {
            return Err(ImputeError::Width {
                got: batch.num_columns(),
                expected: self.plan.columns.len(),
            });
        }

        let mut stats = ImputeStats::default();
        for (index, (col, cp)) in batch.columns.iter_mut().zip(&self.plan.columns).enumerate() {
            if col.name != cp.name {
                return Err(ImputeError::Column {
                    index,
                    got: col.name.clone(),
                    expected: cp.name.clone(),
                });
            }
            if col.null_count() == 0 {
                continue;
            }
            match cp.strategy {
                ColumnStrategy::Numeric(_) if col.values.iter().any(|v| v.as_str().is_some()) => {
                    stats.text_columns += 1;
                    tracing::debug!(column = %col.name, row_offset, "numeric column holds text in chunk, filled as categorical");
                    self.fill_categorical(&mut col.values, cp.text_method, &mut stats);
                }
                ColumnStrategy::Numeric(method) => {
                    let n = fill_numeric(&mut col.values, method, row_offset);
                    if n == 0 {
                        stats.columns_left_missing += 1;
                        tracing::debug!(column = %col.name, row_offset, "numeric column has no values in chunk, left missing");
                    }
                    stats.cells_filled += n as u64;
                }
                ColumnStrategy::Categorical(method) => {
                    self.fill_categorical(&mut col.values, method, &mut stats);
                }
            }
        }
        Ok(stats)
    }

    fn fill_categorical(&self, values: &mut [Scalar], method: CategoricalMethod, stats: &mut ImputeStats) {
        let literal = &self.plan.unknown_literal;
        let (n, used_literal) = match method {
            CategoricalMethod::Mode => fill_mode(values, literal),
            CategoricalMethod::Forward => fill_forward(values, literal),
        };
        if used_literal {
            stats.literal_columns += 1;
        }
        stats.cells_filled += n as u64;
    }
}

//! Missing-value profile of a chunk, logged before a run starts.

use hmerge_core::types::RowBatch;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMissing {
    pub name: String,
    pub missing: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingProfile {
    pub rows: usize,
    /// Only columns with at least one missing cell, in column order.
    pub columns: Vec<ColumnMissing>,
}

impl MissingProfile {
    pub fn of(batch: &RowBatch) -> Self {
        let rows = batch.num_rows();
        let columns = batch
            .columns
            .iter()
            .filter_map(|c| {
                let missing = c.null_count();
                (missing > 0).then(|| ColumnMissing {
                    name: c.name.clone(),
                    missing,
                    percent: missing as f64 * 100.0 / rows as f64,
                })
            })
            .collect();
        Self { rows, columns }
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }

    pub fn log(&self) {
        tracing::info!(
            rows = self.rows,
            columns_with_gaps = self.columns.len(),
            "missing-value profile of first chunk"
        );
        for c in &self.columns {
            tracing::info!(
                column = %c.name,
                missing = c.missing,
                "{:.2}% missing",
                c.percent
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmerge_core::types::{Column, Scalar};

    #[test]
    fn counts_only_gappy_columns() {
        let batch = RowBatch::new(vec![
            Column::new("full", vec![Scalar::I64(1), Scalar::I64(2)]),
            Column::new("gappy", vec![Scalar::Null, Scalar::I64(2)]),
        ]);
        let p = MissingProfile::of(&batch);
        assert_eq!(p.columns.len(), 1);
        assert_eq!(p.columns[0].name, "gappy");
        assert_eq!(p.columns[0].percent, 50.0);
        assert_eq!(p.total_missing(), 1);
    }
}

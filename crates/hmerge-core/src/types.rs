//! Lightweight value/column containers for streamed chunks.
//!
//! A chunk is a `RowBatch`: columnar `Vec<Scalar>` storage with a fixed row
//! count shared by every column.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Missing cell (empty field, NA token, or a coerced parse failure).
    Null,
    I64(i64),
    F64(f64),
    Str(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view used by interpolation. Strings never coerce here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::I64(i) => Some(*i as f64),
            Scalar::F64(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Rough heap + inline footprint, for budget accounting.
    pub fn approx_bytes(&self) -> usize {
        let inline = std::mem::size_of::<Scalar>();
        match self {
            Scalar::Str(s) => inline + s.capacity(),
            _ => inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Empty batch carrying column names only.
    pub fn empty_like(names: &[&str]) -> Self {
        Self {
            columns: names.iter().map(|n| Column::new(*n, Vec::new())).collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check that every column has the same row count.
    pub fn validate(&self) -> Result<()> {
        let n = self.num_rows();
        for c in &self.columns {
            if c.len() != n {
                return Err(Error::Invariant(format!(
                    "column '{}' has {} rows, expected {}",
                    c.name,
                    c.len(),
                    n
                )));
            }
        }
        Ok(())
    }

    /// Concatenate batches side-by-side (one positional row per output row).
    ///
    /// All parts must have the same row count and disjoint column names.
    pub fn concat(parts: Vec<RowBatch>) -> Result<RowBatch> {
        let rows = parts.first().map(|b| b.num_rows()).unwrap_or(0);
        let width = parts.iter().map(|b| b.num_columns()).sum();
        let mut columns: Vec<Column> = Vec::with_capacity(width);
        for part in parts {
            if part.num_rows() != rows {
                return Err(Error::Invariant(format!(
                    "cannot concat batches with different row counts: {} vs {}",
                    rows,
                    part.num_rows()
                )));
            }
            for col in part.columns {
                if columns.iter().any(|c| c.name == col.name) {
                    return Err(Error::Schema(format!(
                        "column '{}' appears in more than one source",
                        col.name
                    )));
                }
                columns.push(col);
            }
        }
        Ok(RowBatch { columns })
    }

    /// Append the rows of `other` below this batch. Column lists must match.
    pub fn append(&mut self, other: RowBatch) -> Result<()> {
        if self.columns.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.columns.len() != self.columns.len() {
            return Err(Error::Schema(format!(
                "cannot append batch with {} columns to batch with {}",
                other.columns.len(),
                self.columns.len()
            )));
        }
        for (dst, src) in self.columns.iter_mut().zip(other.columns) {
            if dst.name != src.name {
                return Err(Error::Schema(format!(
                    "column mismatch on append: '{}' vs '{}'",
                    dst.name, src.name
                )));
            }
            dst.values.extend(src.values);
        }
        Ok(())
    }

    pub fn approx_bytes(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.name.len() + c.values.iter().map(Scalar::approx_bytes).sum::<usize>())
            .sum()
    }
}

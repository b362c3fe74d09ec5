//! Column strategies and the prefix -> policy table.
//!
//! A column's prefix is the text before its first `_` (`NRD_AGE` -> `NRD`).
//! Prefixes without an entry use linear interpolation for numeric columns and
//! the chunk mode for categorical ones.

use std::collections::BTreeMap;

use hmerge_core::schema::{ColumnKind, Schema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericMethod {
    #[default]
    Linear,
    /// Interpolate against the absolute row offset.
    Time,
    /// Quadratic through the nearest known points around a gap.
    Polynomial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalMethod {
    #[default]
    Mode,
    #[serde(alias = "ffill")]
    Forward,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPolicy {
    #[serde(default)]
    pub numeric_method: NumericMethod,
    #[serde(default)]
    pub categorical_method: CategoricalMethod,
}

impl DatasetPolicy {
    pub fn new(numeric_method: NumericMethod, categorical_method: CategoricalMethod) -> Self {
        Self {
            numeric_method,
            categorical_method,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "method", rename_all = "lowercase")]
pub enum ColumnStrategy {
    Numeric(NumericMethod),
    Categorical(CategoricalMethod),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    by_prefix: BTreeMap<String, DatasetPolicy>,
}

impl PolicyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in entries for the HCUP dataset prefixes.
    pub fn hcup_defaults() -> Self {
        let mut t = Self::empty();
        for prefix in ["NRD", "NIS", "KID", "NEDS"] {
            t.insert(prefix, DatasetPolicy::default());
        }
        t
    }

    pub fn insert(&mut self, prefix: impl Into<String>, policy: DatasetPolicy) {
        self.by_prefix.insert(prefix.into(), policy);
    }

    /// Overlay `other` on top of this table; its entries win.
    pub fn merge(&mut self, other: &PolicyTable) {
        for (k, v) in &other.by_prefix {
            self.by_prefix.insert(k.clone(), *v);
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&DatasetPolicy> {
        self.by_prefix.get(prefix)
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }

    /// Policy for `column` by its prefix, or the default policy.
    pub fn policy_for(&self, column: &str) -> DatasetPolicy {
        column_prefix(column)
            .and_then(|p| self.get(p))
            .copied()
            .unwrap_or_default()
    }

    pub fn resolve(&self, column: &str, kind: ColumnKind) -> ColumnStrategy {
        let policy = self.policy_for(column);
        match kind {
            ColumnKind::Numeric => ColumnStrategy::Numeric(policy.numeric_method),
            ColumnKind::Categorical => ColumnStrategy::Categorical(policy.categorical_method),
        }
    }
}

pub fn column_prefix(name: &str) -> Option<&str> {
    name.split_once('_').map(|(p, _)| p)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPlan {
    pub name: String,
    pub strategy: ColumnStrategy,
    /// Used instead of a numeric strategy for chunks where the column holds text.
    pub text_method: CategoricalMethod,
}

/// Per-column strategies for one merged schema, resolved before streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputePlan {
    pub columns: Vec<ColumnPlan>,
    pub unknown_literal: String,
}

impl ImputePlan {
    pub fn resolve(schema: &Schema, table: &PolicyTable, unknown_literal: impl Into<String>) -> Self {
        Self {
            columns: schema
                .fields
                .iter()
                .map(|f| ColumnPlan {
                    name: f.name.clone(),
                    strategy: table.resolve(&f.name, f.kind()),
                    text_method: table.policy_for(&f.name).categorical_method,
                })
                .collect(),
            unknown_literal: unknown_literal.into(),
        }
    }
}

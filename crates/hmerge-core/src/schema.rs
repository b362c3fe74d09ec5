//! Logical schema types. Pure data.
//!
//! Every column carries a `DataType`; the imputation policy only cares whether
//! it is numeric or categorical, which `DataType::kind` answers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Whole numbers; cells that only parse as floats still decode as `F64`.
    Int64,
    Float64,
    Utf8,
}

/// Semantic split used by imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl DataType {
    pub fn kind(self) -> ColumnKind {
        match self {
            DataType::Int64 | DataType::Float64 => ColumnKind::Numeric,
            DataType::Utf8 => ColumnKind::Categorical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data_type.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// All-`Utf8` schema, used before types are known.
    pub fn utf8<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .map(|n| Field::new(n.as_ref(), DataType::Utf8, true))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Namespace every column as `<prefix>_<name>`.
    pub fn with_prefix(&self, prefix: &str) -> Schema {
        Schema::new(
            self.fields
                .iter()
                .map(|f| Field {
                    name: format!("{prefix}_{}", f.name),
                    ..f.clone()
                })
                .collect(),
        )
    }

    /// Side-by-side concatenation. Names must stay unique.
    pub fn concat(parts: &[&Schema]) -> Result<Schema> {
        let mut fields: Vec<Field> = Vec::with_capacity(parts.iter().map(|s| s.len()).sum());
        for part in parts {
            for f in &part.fields {
                if fields.iter().any(|g| g.name == f.name) {
                    return Err(Error::Schema(format!(
                        "duplicate column '{}' in merged schema",
                        f.name
                    )));
                }
                fields.push(f.clone());
            }
        }
        Ok(Schema::new(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_concat() {
        let a = Schema::new(vec![
            Field::new("id_local", DataType::Int64, true),
            Field::new("x", DataType::Float64, true),
        ])
        .with_prefix("A");
        let b = Schema::utf8(&["y"]).with_prefix("B");
        let merged = Schema::concat(&[&a, &b]).unwrap();
        assert_eq!(merged.names(), vec!["A_id_local", "A_x", "B_y"]);
        assert_eq!(merged.fields[1].kind(), ColumnKind::Numeric);
        assert_eq!(merged.fields[2].kind(), ColumnKind::Categorical);
    }

    #[test]
    fn concat_rejects_collisions() {
        let a = Schema::utf8(&["AGE"]);
        let b = Schema::utf8(&["AGE"]);
        assert!(Schema::concat(&[&a, &b]).is_err());
    }
}

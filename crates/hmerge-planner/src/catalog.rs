//! Embedded HCUP column layouts.
//!
//! Dataset kind -> file groups -> ordered columns with descriptions. Used to
//! describe columns and to flag source columns a declared layout does not list.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

static CATALOG_YAML: &str = include_str!("../data/catalog.yaml");

static CATALOG: Lazy<Result<Catalog, String>> =
    Lazy::new(|| serde_yaml::from_str(CATALOG_YAML).map_err(|e| e.to_string()));

/// The embedded catalog, parsed on first use.
pub fn catalog() -> Result<&'static Catalog, PlanError> {
    CATALOG.as_ref().map_err(|e| PlanError::Catalog(e.clone()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetKind {
    /// Nationwide Readmissions Database
    Nrd,
    /// Nationwide Inpatient Sample
    Nis,
    /// Kids' Inpatient Database
    Kid,
    /// Nationwide Emergency Department Sample
    Neds,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Nrd,
        DatasetKind::Nis,
        DatasetKind::Kid,
        DatasetKind::Neds,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetKind::Nrd => "NRD",
            DatasetKind::Nis => "NIS",
            DatasetKind::Kid => "KID",
            DatasetKind::Neds => "NEDS",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PlanError::Invalid(format!("unknown dataset kind '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<CatalogColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetLayout {
    pub kind: DatasetKind,
    pub groups: Vec<ColumnGroup>,
}

impl DatasetLayout {
    pub fn group(&self, name: &str) -> Option<&ColumnGroup> {
        self.groups.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    pub fn columns(&self) -> impl Iterator<Item = &CatalogColumn> {
        self.groups.iter().flat_map(|g| g.columns.iter())
    }

    pub fn describe(&self, column: &str) -> Option<&str> {
        self.columns()
            .find(|c| c.name == column)
            .map(|c| c.description.as_str())
    }

    /// Source columns missing from the layout (or from `group`, when given).
    pub fn unknown_columns<'a>(
        &self,
        group: Option<&str>,
        columns: &'a [String],
    ) -> Result<Vec<&'a str>, PlanError> {
        let known: Vec<&str> = match group {
            Some(g) => self
                .group(g)
                .ok_or_else(|| {
                    PlanError::Invalid(format!("dataset {} has no file group '{g}'", self.kind))
                })?
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect(),
            None => self.columns().map(|c| c.name.as_str()).collect(),
        };
        Ok(columns
            .iter()
            .map(String::as_str)
            .filter(|c| !known.contains(c))
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub datasets: Vec<DatasetLayout>,
}

impl Catalog {
    pub fn dataset(&self, kind: DatasetKind) -> Option<&DatasetLayout> {
        self.datasets.iter().find(|d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let cat = catalog().unwrap();
        let nrd = cat.dataset(DatasetKind::Nrd).unwrap();
        assert_eq!(nrd.groups[0].name, "core");
        assert_eq!(nrd.groups[0].columns[0].name, "AGE");
        assert_eq!(nrd.describe("AGE"), Some("Age in years at admission"));
        assert!(cat.dataset(DatasetKind::Neds).unwrap().group("ed").is_some());
        assert!(cat.dataset(DatasetKind::Kid).is_some());
    }

    #[test]
    fn flags_unlisted_columns() {
        let nrd = catalog().unwrap().dataset(DatasetKind::Nrd).unwrap();
        let cols = vec!["AGE".to_string(), "MYSTERY".to_string()];
        assert_eq!(nrd.unknown_columns(Some("core"), &cols).unwrap(), vec!["MYSTERY"]);
        assert!(nrd.unknown_columns(Some("nope"), &cols).is_err());
    }

    #[test]
    fn kind_from_str_ignores_case() {
        assert_eq!("neds".parse::<DatasetKind>().unwrap(), DatasetKind::Neds);
        assert!("xyz".parse::<DatasetKind>().is_err());
    }
}

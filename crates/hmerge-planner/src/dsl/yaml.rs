//! YAML merge job format.
//!
//! Example:
//! ```yaml
//! output: out/combined.csv
//! config:
//!   chunk_rows: 50000
//!   flush_rows: 1000000
//! sources:
//!   - { path: data/NRD_2019_Core.csv, dataset: NRD, group: core }
//!   - { path: data/KID_2019_Core.csv, prefix: KID, delimiter: tab }
//!   - path: data/extra.psv
//!     prefix: EXT
//!     columns: [id, score, label]
//! policies:
//!   EXT: { numeric_method: polynomial, categorical_method: forward }
//! ```
//!
//! A source's prefix defaults to its dataset kind. Sources without either keep
//! their column names as-is.

use std::path::{Path, PathBuf};

use hmerge_core::config::EngineConfig;
use hmerge_impute::PolicyTable;
use serde::{Deserialize, Serialize};

use crate::catalog::DatasetKind;
use crate::error::PlanError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeJob {
    pub output: PathBuf,
    pub sources: Vec<SourceSpec>,

    #[serde(default)]
    pub config: JobConfig,

    /// Prefix -> strategy overrides, layered over the built-in table.
    #[serde(default)]
    pub policies: PolicyTable,

    /// Start from the built-in HCUP policy entries.
    #[serde(default = "default_true")]
    pub builtin_policies: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub dataset: Option<DatasetKind>,
    /// File group within the dataset layout (`core`, `hospital`, ...).
    #[serde(default)]
    pub group: Option<String>,
    /// Single character, or one of `comma`, `tab`, `pipe`.
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Column names for a headerless file.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Output prefix: explicit prefix, else the dataset kind.
    pub fn effective_prefix(&self) -> Option<String> {
        self.prefix
            .clone()
            .or_else(|| self.dataset.map(|d| d.as_str().to_string()))
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>, PlanError> {
        self.delimiter.as_deref().map(parse_delimiter).transpose()
    }
}

/// Job-level overrides of `EngineConfig`. Unset fields keep the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub mem_cap_bytes: Option<usize>,
    pub flush_rows: Option<usize>,
    pub chunk_rows: Option<usize>,
    pub min_chunk_rows: Option<usize>,
    pub max_chunk_rows: Option<usize>,
    pub count_rows: Option<bool>,
    pub progress_every_chunks: Option<usize>,
    pub unknown_literal: Option<String>,
}

impl JobConfig {
    pub fn apply(&self, cfg: &mut EngineConfig) {
        if let Some(v) = self.mem_cap_bytes {
            cfg.mem_cap_bytes = v;
        }
        if let Some(v) = self.flush_rows {
            cfg.flush_rows = v;
        }
        if let Some(v) = self.chunk_rows {
            cfg.chunk_rows = Some(v);
        }
        if let Some(v) = self.min_chunk_rows {
            cfg.chunk_bounds.min_rows = v;
        }
        if let Some(v) = self.max_chunk_rows {
            cfg.chunk_bounds.max_rows = v;
        }
        if let Some(v) = self.count_rows {
            cfg.count_rows = v;
        }
        if let Some(v) = self.progress_every_chunks {
            cfg.progress_every_chunks = v;
        }
        if let Some(v) = &self.unknown_literal {
            cfg.unknown_literal = v.clone();
        }
    }
}

fn default_true() -> bool {
    true
}

pub fn parse_delimiter(s: &str) -> Result<u8, PlanError> {
    match s {
        "comma" => Ok(b','),
        "tab" | "\\t" => Ok(b'\t'),
        "pipe" => Ok(b'|'),
        "semicolon" => Ok(b';'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(*b),
            _ => Err(PlanError::Invalid(format!("unusable delimiter {s:?}"))),
        },
    }
}

/// Parse and check a job document.
pub fn parse_job(yaml_src: &str) -> Result<MergeJob, PlanError> {
    let job: MergeJob = serde_yaml::from_str(yaml_src)?;
    validate(&job)?;
    Ok(job)
}

pub fn load_job(path: &Path) -> Result<MergeJob, PlanError> {
    let src = std::fs::read_to_string(path).map_err(|source| PlanError::File {
        context: format!("reading job file {}", path.display()),
        source,
    })?;
    parse_job(&src)
}

fn validate(job: &MergeJob) -> Result<(), PlanError> {
    if job.sources.is_empty() {
        return Err(PlanError::Invalid("at least one source is required".into()));
    }
    let mut seen: Vec<String> = Vec::new();
    for s in &job.sources {
        s.delimiter_byte()?;
        if let Some(cols) = &s.columns {
            if cols.is_empty() {
                return Err(PlanError::Invalid(format!(
                    "{}: column list is empty",
                    s.path.display()
                )));
            }
        }
        if let Some(p) = s.effective_prefix() {
            if p.is_empty() {
                return Err(PlanError::Invalid(format!(
                    "{}: prefix is empty",
                    s.path.display()
                )));
            }
            if seen.contains(&p) {
                return Err(PlanError::Invalid(format!("prefix '{p}' used by more than one source")));
            }
            seen.push(p);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmerge_impute::{ColumnStrategy, NumericMethod};
    use hmerge_core::schema::ColumnKind;

    const JOB: &str = r#"
output: out/combined.csv
config:
  chunk_rows: 500
  count_rows: false
sources:
  - { path: a.csv, dataset: NRD }
  - { path: b.tsv, prefix: B, delimiter: tab, columns: [id, v] }
policies:
  B: { numeric_method: time }
"#;

    #[test]
    fn parses_sources_config_and_policies() {
        let job = parse_job(JOB).unwrap();
        assert_eq!(job.sources.len(), 2);
        assert_eq!(job.sources[0].effective_prefix().as_deref(), Some("NRD"));
        assert_eq!(job.sources[1].delimiter_byte().unwrap(), Some(b'\t'));
        assert!(job.builtin_policies);

        let mut cfg = EngineConfig::default();
        job.config.apply(&mut cfg);
        assert_eq!(cfg.chunk_rows, Some(500));
        assert!(!cfg.count_rows);
        assert_eq!(cfg.flush_rows, 1_000_000);

        assert_eq!(
            job.policies.resolve("B_v", ColumnKind::Numeric),
            ColumnStrategy::Numeric(NumericMethod::Time)
        );
    }

    #[test]
    fn rejects_duplicate_prefixes() {
        let src = "output: o.csv\nsources:\n  - { path: a.csv, prefix: X }\n  - { path: b.csv, prefix: X }\n";
        assert!(matches!(parse_job(src), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_source_list() {
        assert!(parse_job("output: o.csv\nsources: []\n").is_err());
    }

    #[test]
    fn delimiter_names() {
        assert_eq!(parse_delimiter("pipe").unwrap(), b'|');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("ab").is_err());
    }
}

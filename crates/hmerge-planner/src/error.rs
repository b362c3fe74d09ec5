use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("invalid job: {0}")]
    Invalid(String),

    #[error("job file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("catalog: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] hmerge_io::Error),

    #[error(transparent)]
    Core(#[from] hmerge_core::Error),

    #[error("{context}: {source}")]
    File {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

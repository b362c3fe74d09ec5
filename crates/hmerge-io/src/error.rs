use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] hmerge_core::Error),

    #[error("cannot detect a delimiter: the first line of {} is not text", .0.display())]
    UndetectableDelimiter(PathBuf),

    #[error("source {} has no header line", .0.display())]
    MissingHeader(PathBuf),

    #[error("schema error: {0}")]
    Schema(String),
}

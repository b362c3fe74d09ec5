#![forbid(unsafe_code)]
//! hmerge-io: streaming readers/writers for delimited sources.
//!
//! - `sniff`: delimiter detection from the first line of a file.
//! - `buf`: bounded buffered readers (fixed read-ahead cap).
//! - `readers`: `CsvChunkReader`, a restartable source of bounded `RowBatch` chunks.
//! - `count`: the row-count pre-pass.
//! - `infer`: numeric vs categorical typing from a sample chunk.
//! - `writers`: `CsvSink`, header-once-then-append with a bounded pending buffer.

pub mod buf;
pub mod count;
pub mod error;
pub mod infer;
pub mod readers;
pub mod sniff;
pub mod writers;

pub use count::count_rows;
pub use error::{Error, Result};
pub use infer::infer_schema;
pub use readers::csv::{CsvChunkReader, PassStats, SourceOptions};
pub use sniff::{detect_delimiter, sniff_delimiter};
pub use writers::csv::{CsvSink, SinkSummary};

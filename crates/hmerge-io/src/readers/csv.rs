//! Restartable chunked reader over one delimited source.
//!
//! Rows come out as bounded `RowBatch` chunks in file order. Bad rows are
//! absorbed: undecodable rows are skipped, rows with the wrong field count are
//! padded or truncated, and numeric cells that do not parse are kept as text.
//! Only I/O errors end a read.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv as csv_crate;
use hmerge_core::schema::{DataType, Schema};
use hmerge_core::types::{Column, RowBatch, Scalar};
use serde::Serialize;

use crate::buf::{bounded_from_path, BoundedBufReader, DEFAULT_READ_AHEAD};
use crate::error::{Error, Result};
use crate::readers::is_missing;
use crate::sniff::sniff_delimiter;

/// Detailed row warnings per pass before the reader drops to debug level.
const MAX_WARNINGS_PER_PASS: u64 = 20;

/// How to open a source.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Field delimiter; sniffed from the first line when `None`.
    pub delimiter: Option<u8>,
    /// Column names for a headerless source. When set, the first line is data.
    pub columns: Option<Vec<String>>,
    /// Read-ahead buffer size in bytes.
    pub buffer_bytes: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            columns: None,
            buffer_bytes: DEFAULT_READ_AHEAD,
        }
    }
}

/// Counters for one full pass over a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// 0 for the first pass, incremented by each `restart`.
    pub pass: u64,
    pub rows_yielded: u64,
    pub rows_skipped: u64,
    /// Rows padded, truncated, or holding at least one coerced cell.
    pub rows_coerced: u64,
    pub cells_coerced: u64,
}

pub struct CsvChunkReader {
    path: PathBuf,
    delimiter: u8,
    has_headers: bool,
    buffer_bytes: usize,
    rdr: csv_crate::Reader<BoundedBufReader<File>>,
    record: csv_crate::ByteRecord,
    source_columns: Vec<String>,
    schema: Schema,
    projection: Option<Vec<usize>>,
    chunk_rows: usize,
    exhausted: bool,
    stats: PassStats,
    warnings: u64,
}

impl CsvChunkReader {
    /// Open `path`, reading the header (or taking `opts.columns`). Every column
    /// starts as `Utf8`; install a typed schema with [`with_schema`](Self::with_schema).
    pub fn open(path: impl AsRef<Path>, opts: &SourceOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let delimiter = match opts.delimiter {
            Some(d) => d,
            None => sniff_delimiter(&path)?,
        };
        let has_headers = opts.columns.is_none();
        let mut rdr = open_csv(&path, delimiter, has_headers, opts.buffer_bytes)?;

        let source_columns: Vec<String> = match &opts.columns {
            Some(cols) => cols.clone(),
            None => {
                let headers = rdr.byte_headers()?;
                if headers.is_empty() {
                    return Err(Error::MissingHeader(path));
                }
                headers
                    .iter()
                    .map(|h| {
                        String::from_utf8_lossy(h)
                            .trim_start_matches('\u{feff}')
                            .trim()
                            .to_string()
                    })
                    .collect()
            }
        };
        if source_columns.is_empty() {
            return Err(Error::Schema(format!(
                "no columns supplied for {}",
                path.display()
            )));
        }

        let schema = Schema::utf8(&source_columns);
        Ok(Self {
            path,
            delimiter,
            has_headers,
            buffer_bytes: opts.buffer_bytes,
            rdr,
            record: csv_crate::ByteRecord::new(),
            source_columns,
            schema,
            projection: None,
            chunk_rows: 100_000,
            exhausted: false,
            stats: PassStats::default(),
            warnings: 0,
        })
    }

    pub fn with_chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows.max(1);
        self
    }

    /// Replace the output schema (names and types). Width must match the source.
    pub fn with_schema(mut self, schema: Schema) -> Result<Self> {
        if schema.len() != self.source_columns.len() {
            return Err(Error::Schema(format!(
                "{}: schema has {} columns, source has {}",
                self.path.display(),
                schema.len(),
                self.source_columns.len()
            )));
        }
        self.schema = schema;
        Ok(self)
    }

    /// Only decode and emit the given source column indices.
    pub fn with_projection(mut self, indices: Vec<usize>) -> Result<Self> {
        if let Some(bad) = indices.iter().find(|&&i| i >= self.source_columns.len()) {
            return Err(Error::Schema(format!(
                "{}: projection index {} out of range ({} columns)",
                self.path.display(),
                bad,
                self.source_columns.len()
            )));
        }
        self.projection = Some(indices);
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    /// Output schema (after projection).
    pub fn schema(&self) -> Schema {
        match &self.projection {
            None => self.schema.clone(),
            Some(idx) => Schema::new(
                idx.iter()
                    .filter_map(|&i| self.schema.field(i).cloned())
                    .collect(),
            ),
        }
    }

    /// Column names exactly as they appear in the source header.
    pub fn source_columns(&self) -> &[String] {
        &self.source_columns
    }

    pub fn stats(&self) -> &PassStats {
        &self.stats
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next chunk of up to `chunk_rows` rows; `None` once the pass is done.
    pub fn next_chunk(&mut self) -> Result<Option<RowBatch>> {
        self.next_rows(self.chunk_rows)
    }

    /// Next chunk of up to `min(limit, chunk_rows)` rows.
    pub fn next_rows(&mut self, limit: usize) -> Result<Option<RowBatch>> {
        let limit = limit.min(self.chunk_rows);
        if self.exhausted || limit == 0 {
            return Ok(None);
        }

        let indices: Vec<usize> = match &self.projection {
            Some(p) => p.clone(),
            None => (0..self.source_columns.len()).collect(),
        };
        let mut cols: Vec<Column> = indices
            .iter()
            .map(|&i| Column::new(self.schema.fields[i].name.clone(), Vec::with_capacity(limit)))
            .collect();

        let width = self.source_columns.len();
        let mut read = 0usize;
        while read < limit {
            match self.rdr.read_byte_record(&mut self.record) {
                Ok(true) => {}
                Ok(false) => {
                    self.exhausted = true;
                    break;
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    self.stats.rows_skipped += 1;
                    self.warn_row(None, &format!("unreadable row skipped: {e}"));
                    continue;
                }
            }
            let line = self.record.position().map(|p| p.line());

            let mut cells: Vec<&str> = Vec::with_capacity(indices.len());
            let mut undecodable = false;
            for &i in &indices {
                match self.record.get(i) {
                    None => cells.push(""),
                    Some(raw) => match std::str::from_utf8(raw) {
                        Ok(s) => cells.push(s),
                        Err(_) => {
                            undecodable = true;
                            break;
                        }
                    },
                }
            }
            if undecodable {
                self.stats.rows_skipped += 1;
                self.warn_row(line, "row is not valid UTF-8, skipped");
                continue;
            }

            let mut row_coerced = false;
            let got = self.record.len();
            let mut width_note = None;
            if got != width {
                row_coerced = true;
                width_note = Some(if got < width {
                    format!("row has {got} fields, expected {width}; padded with missing")
                } else {
                    format!("row has {got} fields, expected {width}; extra fields dropped")
                });
            }

            let mut bad_cells = 0u64;
            for (col, (&i, cell)) in cols.iter_mut().zip(indices.iter().zip(cells)) {
                let (v, coerced) = parse_cell(cell, self.schema.fields[i].data_type);
                if coerced {
                    bad_cells += 1;
                }
                col.values.push(v);
            }

            if let Some(note) = width_note {
                self.warn_row(line, &note);
            }
            if bad_cells > 0 {
                row_coerced = true;
                self.stats.cells_coerced += bad_cells;
                self.warn_row(
                    line,
                    &format!("{bad_cells} cell(s) in numeric columns did not parse as numbers"),
                );
            }
            if row_coerced {
                self.stats.rows_coerced += 1;
            }
            read += 1;
        }

        if read == 0 {
            return Ok(None);
        }
        self.stats.rows_yielded += read as u64;
        Ok(Some(RowBatch::new(cols)))
    }

    /// Re-open the source and continue from its first data row.
    pub fn restart(&mut self) -> Result<()> {
        let mut rdr = open_csv(&self.path, self.delimiter, self.has_headers, self.buffer_bytes)?;
        if self.has_headers {
            rdr.byte_headers()?;
        }
        self.rdr = rdr;
        self.exhausted = false;
        self.stats = PassStats {
            pass: self.stats.pass + 1,
            ..PassStats::default()
        };
        self.warnings = 0;
        tracing::debug!(path = %self.path.display(), pass = self.stats.pass, "source restarted");
        Ok(())
    }

    fn warn_row(&mut self, line: Option<u64>, msg: &str) {
        self.warnings += 1;
        let path = self.path.display();
        if self.warnings <= MAX_WARNINGS_PER_PASS {
            tracing::warn!(path = %path, line, "{msg}");
            if self.warnings == MAX_WARNINGS_PER_PASS {
                tracing::warn!(path = %path, "further row warnings for this pass logged at debug level");
            }
        } else {
            tracing::debug!(path = %path, line, "{msg}");
        }
    }
}

fn open_csv(
    path: &Path,
    delimiter: u8,
    has_headers: bool,
    buffer_bytes: usize,
) -> Result<csv_crate::Reader<BoundedBufReader<File>>> {
    let input = bounded_from_path(path, buffer_bytes)?;
    Ok(csv_crate::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(input))
}

/// Decode one cell. The flag is set when a non-missing cell does not fit the
/// column's numeric type.
fn parse_cell(cell: &str, data_type: DataType) -> (Scalar, bool) {
    if is_missing(cell) {
        return (Scalar::Null, false);
    }
    match data_type {
        DataType::Utf8 => (Scalar::Str(cell.to_string()), false),
        DataType::Int64 => {
            let t = cell.trim();
            if let Ok(i) = t.parse::<i64>() {
                return (Scalar::I64(i), false);
            }
            parse_float(cell)
        }
        DataType::Float64 => parse_float(cell),
    }
}

/// Text that is not a number stays text; the imputer treats a chunk holding it
/// as categorical. Non-finite numbers become missing.
fn parse_float(cell: &str) -> (Scalar, bool) {
    match cell.trim().parse::<f64>() {
        Ok(f) if f.is_finite() => (Scalar::F64(f), false),
        Ok(_) => (Scalar::Null, true),
        Err(_) => (Scalar::Str(cell.to_string()), true),
    }
}

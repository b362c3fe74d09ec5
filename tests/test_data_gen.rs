//! Fixture helpers shared by the integration tests.
#![allow(dead_code)]

use hmerge_core::types::{Column, RowBatch, Scalar};
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh, empty directory under the system temp dir, unique per test and process.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hmerge-test-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

/// Write `header` then one line per row.
pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let mut body = String::from(header);
    body.push('\n');
    for r in rows {
        body.push_str(r);
        body.push('\n');
    }
    write_raw(dir, name, body.as_bytes())
}

pub fn write_raw(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("Failed to write fixture");
    path
}

/// `rows` lines of `id,label` where label is `<tag>-<id>`.
pub fn numbered_csv(dir: &Path, name: &str, tag: &str, rows: usize) -> PathBuf {
    let lines: Vec<String> = (0..rows).map(|i| format!("{i},{tag}-{i}")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_csv(dir, name, "id,label", &refs)
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .map(str::to_string)
        .collect()
}

/// One column of an output file, by header name.
pub fn column_of(path: &Path, name: &str) -> Vec<String> {
    let mut rdr = csv::Reader::from_path(path).expect("Failed to open output");
    let idx = rdr
        .headers()
        .expect("Failed to read header")
        .iter()
        .position(|h| h == name)
        .expect("column not in output");
    rdr.records()
        .map(|r| r.expect("bad output row")[idx].to_string())
        .collect()
}

pub fn int_column(name: &str, values: &[i64]) -> Column {
    Column::new(name, values.iter().map(|v| Scalar::I64(*v)).collect())
}

pub fn str_column(name: &str, values: &[Option<&str>]) -> Column {
    Column::new(
        name,
        values
            .iter()
            .map(|v| v.map(|s| Scalar::Str(s.to_string())).unwrap_or(Scalar::Null))
            .collect(),
    )
}

pub fn float_column(name: &str, values: &[Option<f64>]) -> Column {
    Column::new(
        name,
        values
            .iter()
            .map(|v| v.map(Scalar::F64).unwrap_or(Scalar::Null))
            .collect(),
    )
}

pub fn batch(columns: Vec<Column>) -> RowBatch {
    RowBatch::new(columns)
}

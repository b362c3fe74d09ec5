//! Chunk reader and row counter tests

mod test_data_gen;

use hmerge_core::types::RowBatch;
use hmerge_io::{count_rows, sniff_delimiter, CsvChunkReader, SourceOptions};
use test_data_gen::{numbered_csv, temp_dir, write_raw};

fn drain(reader: &mut CsvChunkReader) -> Vec<RowBatch> {
    let mut out = Vec::new();
    while let Some(chunk) = reader.next_chunk().expect("read failed") {
        out.push(chunk);
    }
    out
}

#[test]
fn test_full_pass_reproduces_rows_in_order() {
    let dir = temp_dir("full-pass");
    let path = numbered_csv(&dir, "src.csv", "row", 103);

    let mut reader = CsvChunkReader::open(&path, &SourceOptions::default())
        .expect("open failed")
        .with_chunk_rows(10);
    let chunks = drain(&mut reader);

    assert_eq!(chunks.len(), 11);
    for c in &chunks {
        assert!(c.num_rows() <= 10, "chunk exceeds its bound");
        c.validate().expect("ragged chunk");
    }

    let mut all = RowBatch::default();
    for c in chunks {
        all.append(c).unwrap();
    }
    let labels: Vec<String> = all.columns[1]
        .values
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (0..103).map(|i| format!("row-{i}")).collect();
    assert_eq!(labels, expected);
}

#[test]
fn test_row_counter_matches_stream() {
    let dir = temp_dir("count");
    let path = numbered_csv(&dir, "src.csv", "r", 2_500);
    let n = count_rows(&path, &SourceOptions::default(), 1_000).unwrap();
    assert_eq!(n, 2_500);
}

#[test]
fn test_sniffs_pipe_and_strips_bom() {
    let dir = temp_dir("bom");
    let path = write_raw(&dir, "src.psv", "\u{feff}KEY|DX1\n1|A01\n2|B02\n".as_bytes());
    assert_eq!(sniff_delimiter(&path).unwrap(), b'|');

    let mut reader = CsvChunkReader::open(&path, &SourceOptions::default()).unwrap();
    assert_eq!(reader.source_columns(), &["KEY".to_string(), "DX1".to_string()]);
    let chunk = reader.next_chunk().unwrap().unwrap();
    assert_eq!(chunk.column_names(), vec!["KEY", "DX1"]);
}

#[test]
fn test_single_column_source_needs_no_delimiter() {
    let dir = temp_dir("nodelim");
    let path = write_raw(&dir, "one.csv", b"single\n1\nNA\n2\n");
    let mut reader = CsvChunkReader::open(&path, &SourceOptions::default()).unwrap();
    assert_eq!(reader.delimiter(), b',');
    let chunk = reader.next_chunk().unwrap().unwrap();
    assert_eq!(chunk.column_names(), vec!["single"]);
    assert_eq!(chunk.num_rows(), 3);
    assert_eq!(chunk.columns[0].null_count(), 1);
}

#[test]
fn test_binary_header_is_an_error() {
    let dir = temp_dir("binary");
    let path = write_raw(&dir, "bin.csv", b"\xff\xfe\x00\n1\n");
    assert!(CsvChunkReader::open(&path, &SourceOptions::default()).is_err());
}

#[test]
fn test_missing_tokens_read_as_null() {
    let dir = temp_dir("na");
    let path = write_raw(&dir, "na.csv", b"a,b\nNA,x\n#N/A,null\n , None\n");
    let mut reader = CsvChunkReader::open(&path, &SourceOptions::default()).unwrap();
    let chunk = reader.next_chunk().unwrap().unwrap();
    assert_eq!(chunk.columns[0].null_count(), 3);
    assert_eq!(chunk.columns[1].null_count(), 2);
}

//! Output sink tests

mod test_data_gen;

use hmerge_core::types::RowBatch;
use hmerge_io::CsvSink;
use hmerge_mem::MemoryBudgetImpl;
use test_data_gen::{batch, float_column, int_column, str_column};

fn chunk(ids: &[i64], scores: &[Option<f64>], tags: &[Option<&str>]) -> RowBatch {
    batch(vec![
        int_column("id", ids),
        float_column("score", scores),
        str_column("tag", tags),
    ])
}

fn render(batches: Vec<RowBatch>, flush_rows: usize, cap: usize) -> (Vec<u8>, u64) {
    let mut sink = CsvSink::to_writer(Vec::new(), flush_rows, MemoryBudgetImpl::new(cap));
    for b in batches {
        sink.push(b).expect("push failed");
    }
    let (bytes, summary) = sink.into_inner().expect("close failed");
    (bytes, summary.rows_written)
}

#[test]
fn test_chunked_output_matches_single_write() {
    let first = chunk(&[1, 2], &[Some(1.5), Some(2.0)], &[Some("a"), Some("b,c")]);
    let second = chunk(&[3], &[None], &[Some("d")]);

    let mut whole = first.clone();
    whole.append(second.clone()).unwrap();

    let (split, split_rows) = render(vec![first, second], 1, 1 << 20);
    let (single, single_rows) = render(vec![whole], 1_000, 1 << 20);

    assert_eq!(split, single);
    assert_eq!(split_rows, 3);
    assert_eq!(single_rows, 3);
    assert_eq!(
        String::from_utf8(split).unwrap(),
        "id,score,tag\n1,1.5,a\n2,2.0,\"b,c\"\n3,,d\n"
    );
}

#[test]
fn test_tiny_budget_still_writes_every_row() {
    let batches: Vec<RowBatch> = (0..5)
        .map(|i| chunk(&[i, i + 100], &[Some(i as f64), None], &[Some("x"), None]))
        .collect();
    let (bytes, rows) = render(batches, 1_000_000, 16);

    assert_eq!(rows, 10);
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.lines().count(), 11);
    assert!(text.starts_with("id,score,tag\n0,0.0,x\n100,,\n"));
}

use criterion::{criterion_group, criterion_main, Criterion};
use hmerge_core::schema::{DataType, Field, Schema};
use hmerge_core::types::{Column, RowBatch, Scalar};
use hmerge_impute::{ImputePlan, Imputer, PolicyTable};
use hmerge_io::CsvSink;
use hmerge_mem::MemoryBudgetImpl;

const ROWS: usize = 10_000;

/// Every seventh numeric cell and every fifth label missing.
fn make_batch(rows: usize) -> RowBatch {
    let mut ids = Vec::with_capacity(rows);
    let mut los = Vec::with_capacity(rows);
    let mut dx = Vec::with_capacity(rows);
    for i in 0..rows {
        ids.push(Scalar::I64(i as i64));
        los.push(if i % 7 == 3 {
            Scalar::Null
        } else {
            Scalar::F64((i % 30) as f64 * 0.5)
        });
        dx.push(if i % 5 == 0 {
            Scalar::Null
        } else {
            Scalar::Str(format!("DX{}", i % 12))
        });
    }
    RowBatch {
        columns: vec![
            Column {
                name: "NRD_KEY".into(),
                values: ids,
            },
            Column {
                name: "NRD_LOS".into(),
                values: los,
            },
            Column {
                name: "NRD_DX1".into(),
                values: dx,
            },
        ],
    }
}

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("NRD_KEY", DataType::Int64, true),
        Field::new("NRD_LOS", DataType::Float64, true),
        Field::new("NRD_DX1", DataType::Utf8, true),
    ])
}

fn bench_impute_chunk(c: &mut Criterion) {
    let batch = make_batch(ROWS);
    let imputer = Imputer::new(ImputePlan::resolve(
        &schema(),
        &PolicyTable::hcup_defaults(),
        "Unknown",
    ));
    c.bench_function("impute_chunk", |b| {
        b.iter(|| {
            let mut chunk = batch.clone();
            imputer.impute(&mut chunk, 0).unwrap();
        })
    });
}

fn bench_write_chunk(c: &mut Criterion) {
    let batch = make_batch(ROWS);
    c.bench_function("write_chunk", |b| {
        b.iter(|| {
            let mut sink = CsvSink::to_writer(
                Vec::with_capacity(256 * 1024),
                ROWS,
                MemoryBudgetImpl::new(64 * 1024 * 1024),
            );
            sink.push(batch.clone()).unwrap();
            sink.finish().unwrap();
        })
    });
}

criterion_group!(merge_path, bench_impute_chunk, bench_write_chunk);
criterion_main!(merge_path);

//! Benchmarks for HuffKV table operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use huffkv::{Options, Table};
use tempfile::TempDir;

fn options() -> Options {
    Options::builder()
        .create_if_missing(true)
        .dump_when_close(false)
        .level_seed(1)
        .build()
}

fn key(i: usize) -> Vec<u8> {
    format!("key{:08}", i).into_bytes()
}

fn filled_table(dir: &TempDir, n: usize) -> Table {
    let table = Table::new(options(), dir.path().join("bench.tbl"));
    table.open().unwrap();
    for i in 0..n {
        table.put(&key(i), b"benchmark-value").unwrap();
    }
    table
}

fn table_benchmarks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();

    c.bench_function("put 1k sequential", |b| {
        b.iter_batched(
            || filled_table(&dir, 0),
            |table| {
                for i in 0..1000 {
                    table.put(&key(i), b"benchmark-value").unwrap();
                }
                table
            },
            BatchSize::SmallInput,
        )
    });

    let table = filled_table(&dir, 10_000);
    let mut i = 0;
    c.bench_function("get hit", |b| {
        b.iter(|| {
            i = (i + 7919) % 10_000;
            black_box(table.get(&key(i)).unwrap())
        })
    });
    c.bench_function("dump 10k", |b| b.iter(|| table.dump().unwrap()));
}

criterion_group!(benches, table_benchmarks);
criterion_main!(benches);

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use slabmap::{SlabHashTable, TableConfig};
use std::collections::HashMap;
use tempfile::tempdir;

type Table = SlabHashTable<8>;

/// Keys are spread u64s, values 1..=250 bytes prefixed with their length.
fn generate_data(size: usize) -> Vec<([u8; 8], Vec<u8>)> {
    (0..size as u64)
        .map(|i| {
            let key = i.wrapping_mul(0x9E37_79B9_7F4A_7C15).to_le_bytes();
            let len = (i % 250 + 1) as usize;
            let value = (0..len).map(|j| b'a' + ((i as usize + j) % 26) as u8).collect();
            (key, value)
        })
        .collect()
}

fn store_all(table: &Table, data: &[([u8; 8], Vec<u8>)]) {
    for (key, value) in data {
        table
            .store(key, 2 + value.len(), |slot| {
                slot[..2].copy_from_slice(&(value.len() as u16).to_le_bytes());
                slot[2..].copy_from_slice(value);
            })
            .unwrap();
    }
}

fn benchmark_store_find(c: &mut Criterion) {
    for &size in &[10_000, 100_000] {
        let mut group = c.benchmark_group(format!("slab_table_size={size}"));
        let data = generate_data(size);
        let config = TableConfig::new(size as u64 / 4 + 1);

        group.bench_function("std::HashMap - insert", |b| {
            b.iter(|| {
                let mut map = HashMap::new();
                for (k, v) in data.iter() {
                    map.insert(black_box(*k), black_box(v.clone()));
                }
            })
        });

        group.bench_function("SlabHashTable - store", |b| {
            b.iter_batched(
                || {
                    let dir = tempdir().unwrap();
                    let table = Table::create(dir.path().join("bench.bin"), config).unwrap();
                    (dir, table)
                },
                |(_dir, table)| store_all(&table, &data),
                BatchSize::PerIteration,
            )
        });

        let dir = tempdir().unwrap();
        let table = Table::create(dir.path().join("bench.bin"), config).unwrap();
        store_all(&table, &data);

        group.bench_function("SlabHashTable - find", |b| {
            b.iter(|| {
                let reader = table.read().unwrap();
                for (k, _) in data.iter() {
                    black_box(reader.find(black_box(k)).unwrap());
                }
            })
        });

        group.finish();
    }
}

criterion_group!(benches, benchmark_store_find);
criterion_main!(benches);

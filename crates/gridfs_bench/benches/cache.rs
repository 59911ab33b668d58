//! Cache and chunk mapper benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridfs_bench::random_data;
use gridfs_core::{chunk_key, ChunkLayout, ChunkMapper};
use gridfs_storage::{Cache, InMemoryCache};
use std::sync::Arc;

/// Benchmark InMemoryCache put operations.
fn bench_inmemory_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_put");

    for size in [512, 4096, 8000, 65536].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let cache = InMemoryCache::new();
            let data = random_data(size);
            let mut index = 0u64;

            b.iter(|| {
                cache
                    .put(&chunk_key("/bench", index % 1024), black_box(data.clone()))
                    .unwrap();
                index += 1;
            });
        });
    }

    group.finish();
}

/// Benchmark chunk fetches through a mapper.
fn bench_mapper_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapper_fetch");

    for size in [512, 4096, 8000, 65536].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
            let mapper = ChunkMapper::new("/bench", ChunkLayout::new(size).unwrap(), cache);
            for index in 0..64 {
                mapper.store_chunk(index, random_data(size)).unwrap();
            }
            let mut index = 0u64;

            b.iter(|| {
                let chunk = mapper.fetch_chunk(black_box(index % 64)).unwrap();
                black_box(chunk);
                index += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inmemory_put, bench_mapper_fetch);

criterion_main!(benches);

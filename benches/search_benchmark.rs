use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ironshard::{LazyText, MemoryBackend};

fn bench_search(c: &mut Criterion) {
  // --- Scenario 1: Needle position ---
  // Cost grows with the number of shards walked before the match.
  let mut group = c.benchmark_group("Search/NeedlePosition");
  let haystack = "abcdefghijklmnopqrstuvwxy".repeat(40_000);
  let backend = MemoryBackend::from_text(&format!("{}NEEDLE", haystack), 50_000).unwrap();
  let text = LazyText::new(&backend);

  group.bench_function("find_at_end", |b| {
    b.iter(|| black_box(text.find(black_box("NEEDLE"), 0, None).unwrap()))
  });
  group.bench_function("contains_absent", |b| {
    b.iter(|| black_box(text.contains(black_box("zzz")).unwrap()))
  });
  group.bench_function("find_near_start", |b| {
    b.iter(|| black_box(text.find(black_box("klmno"), 0, None).unwrap()))
  });
  group.finish();

  // --- Scenario 2: Shard size ---
  // Same text, same needle; only the sharding changes. Smaller shards mean
  // more overlap windows and more backend calls.
  let mut group = c.benchmark_group("Search/ShardSize");
  let data = format!("{}NEEDLE", "the quick brown fox ".repeat(50_000));
  group.throughput(Throughput::Bytes(data.len() as u64));

  for shard_size in [1_000u64, 10_000, 100_000].iter() {
    let backend = MemoryBackend::from_text(&data, *shard_size).unwrap();
    group.bench_with_input(BenchmarkId::from_parameter(shard_size), shard_size, |b, _| {
      let text = LazyText::new(&backend);
      b.iter(|| black_box(text.find("NEEDLE", 0, None).unwrap()))
    });
  }
  group.finish();

  // --- Scenario 3: Equality ---
  let mut group = c.benchmark_group("Search/Equality");
  let data = "0123456789".repeat(100_000);
  let a = MemoryBackend::from_text(&data, 7_000).unwrap();
  let b_backend = MemoryBackend::from_text(&data, 13_000).unwrap();

  group.bench_function("eq_str", |b| {
    let text = LazyText::new(&a);
    b.iter(|| black_box(text.try_eq_str(&data).unwrap()))
  });
  group.bench_function("eq_differently_sharded", |b| {
    let (left, right) = (LazyText::new(&a), LazyText::new(&b_backend));
    b.iter(|| black_box(left.try_eq(&right).unwrap()))
  });
  group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::str::FromStr;
use std::time::Duration;

use eth_transfer_watch::cache::DedupCache;
use eth_transfer_watch::models::{fiat_value, intensity_units};
use rust_decimal::Decimal;

fn tx_hash(id: u64) -> String {
    format!("0x{:064x}", id)
}

fn bench_dedup_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_record");

    for size in [100u64, 1000, 10_000].iter() {
        let hashes: Vec<String> = (0..*size).map(tx_hash).collect();
        group.bench_with_input(BenchmarkId::new("record_with_eviction", size), &hashes, |b, hashes| {
            b.iter(|| {
                let mut cache = DedupCache::default();
                for hash in hashes {
                    cache.record(black_box(hash));
                }
                cache.len()
            });
        });
    }

    group.finish();
}

fn bench_dedup_lookup(c: &mut Criterion) {
    let mut cache = DedupCache::default();
    for i in 0..1000 {
        cache.record(&tx_hash(i));
    }
    let hit = tx_hash(500);
    let miss = tx_hash(5000);

    let mut group = c.benchmark_group("dedup_lookup");
    group.bench_function("hit", |b| b.iter(|| cache.contains(black_box(&hit))));
    group.bench_function("miss", |b| b.iter(|| cache.contains(black_box(&miss))));
    group.finish();
}

fn bench_alert_amounts(c: &mut Criterion) {
    let amount = Decimal::from_str("0.123456789012345678").unwrap();
    let rate = Some(Decimal::from_str("1834.52").unwrap());

    c.bench_function("fiat_and_intensity", |b| {
        b.iter(|| {
            let fiat = fiat_value(black_box(amount), black_box(rate));
            (fiat, intensity_units(black_box(amount), black_box(rate)))
        })
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(50);
    targets = bench_dedup_record, bench_dedup_lookup, bench_alert_amounts
);
criterion_main!(benches);

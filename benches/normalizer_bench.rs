//! 金额归一化基准测试
//!
//! 归一化在每次prepare时对全部收款条目执行，批量大时位于热路径

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use payforge::service::amount_normalizer::AmountNormalizer;

fn bench_to_base_units(c: &mut Criterion) {
    c.bench_function("to_base_units_18_decimals", |b| {
        b.iter(|| AmountNormalizer::to_base_units(black_box("1234.567890123456789"), 18))
    });
    c.bench_function("to_base_units_truncating", |b| {
        b.iter(|| AmountNormalizer::to_base_units(black_box("0.123456789012345678901"), 6))
    });
}

fn bench_normalize_all(c: &mut Criterion) {
    let amounts: Vec<String> = (1..=500).map(|i| format!("{}.{:06}", i, i * 7)).collect();
    c.bench_function("normalize_all_500_entries", |b| {
        b.iter(|| AmountNormalizer::normalize_all(black_box(&amounts), 18))
    });
}

criterion_group!(benches, bench_to_base_units, bench_normalize_all);
criterion_main!(benches);

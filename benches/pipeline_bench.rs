use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use archetype_engine::{analyze_chaos, extract_signals, run_pipeline, Catalogs, EngineConfig};

const TEXT: &str = "Urgent: inventory shortage, quality defects and delays. Too much pressure, need help!";

fn bench_pipeline(c: &mut Criterion) {
    let at = Utc::now();
    let catalogs = Catalogs::builtin(at);
    let config = EngineConfig::default();
    let history: Vec<String> = (0..5).map(|i| format!("earlier report {}", i)).collect();

    c.bench_function("extract_signals", |b| b.iter(|| extract_signals(black_box(TEXT))));
    c.bench_function("analyze_chaos", |b| b.iter(|| analyze_chaos(black_box(TEXT), black_box(&history))));
    c.bench_function("run_pipeline", |b| {
        b.iter(|| run_pipeline(black_box(TEXT), &catalogs, &config, None, at))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use proofchain::primitives::canonicalize;
use proofchain::{verify_values, VerifyOptions};
use proofchain_testkit::TestFixture;
use serde_json::json;

fn bench_canonicalize(c: &mut Criterion) {
    let results: Vec<_> = (0..50)
        .map(|i| json!({"rank": i, "score": f64::from(i) / 7.0, "id": format!("doc-{i}")}))
        .collect();
    let payload = json!({
        "tool": "search",
        "args": {"query": "proof chains", "limit": 25, "filters": {"lang": "en", "since": 2024}},
        "results": results,
    });
    c.bench_function("canonicalize_nested_payload", |b| {
        b.iter(|| canonicalize(black_box(&payload)))
    });
}

fn bench_verify(c: &mut Criterion) {
    let fixture = TestFixture::with_seed([0x42; 32]);
    let options = VerifyOptions::default();
    let mut group = c.benchmark_group("verify_chain");
    for n in [10usize, 100, 1000] {
        let values = fixture.chain_values(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| verify_values(black_box(values), fixture.public_key(), &options))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_canonicalize, bench_verify);
criterion_main!(benches);

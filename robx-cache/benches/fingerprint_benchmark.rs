//! Benchmarks for fingerprint computation

use criterion::{Criterion, criterion_group, criterion_main};
use reqwest::Method;
use robx_cache::Fingerprint;
use serde_json::json;
use std::hint::black_box;

fn bench_fingerprint(c: &mut Criterion) {
    let query = vec![
        ("sortOrder".to_string(), json!("Asc")),
        ("limit".to_string(), json!(100)),
        ("fields".to_string(), json!("id,name,created")),
    ];
    let body = json!({
        "ids": (0..50).collect::<Vec<i64>>(),
        "sessionId": "ignored",
        "options": {"archived": false, "scope": null}
    });

    c.bench_function("fingerprint_compute", |b| {
        b.iter(|| {
            Fingerprint::compute(
                &Method::POST,
                black_box("https://games.roblox.com/v1/games/multiget?b=2&a=1"),
                black_box(&query),
                Some(black_box(&body)),
                "SUFFIX-MARKER",
            )
        });
    });
}

criterion_group!(benches, bench_fingerprint);
criterion_main!(benches);

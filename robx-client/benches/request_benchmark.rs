//! Benchmarks for request building and response handling

use criterion::{Criterion, criterion_group, criterion_main};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use robx_client::{HttpClient, Response};
use serde_json::json;
use std::hint::black_box;

fn bench_request_building(c: &mut Criterion) {
    let client = HttpClient::new().unwrap();

    c.bench_function("request_build", |b| {
        b.iter(|| {
            let request = client
                .get("https://games.roblox.com/v1/games/list")
                .query("sortOrder", black_box("Asc"))
                .query("limit", black_box(50))
                .build()
                .unwrap();
            black_box(request)
        });
    });
}

fn bench_response_json(c: &mut Criterion) {
    let body = serde_json::to_vec(&json!({
        "data": (0..100)
            .map(|i| json!({"id": i, "name": format!("place-{i}")}))
            .collect::<Vec<_>>()
    }))
    .unwrap();
    let response = Response::from_parts(StatusCode::OK, HeaderMap::new(), body);

    c.bench_function("response_json", |b| {
        b.iter(|| {
            let value: serde_json::Value = response.json().unwrap();
            black_box(value)
        });
    });
}

criterion_group!(benches, bench_request_building, bench_response_json);
criterion_main!(benches);

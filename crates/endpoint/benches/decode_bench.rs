use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use micro_endpoint::context::SimpleRequest;
use micro_endpoint::io::{get, header_opt, json_body, path, path_param, post, query_list, query_opt, text_body};
use serde::{Deserialize, Serialize};
use std::hint::black_box;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Item {
    id: u64,
    name: String,
    tags: Vec<String>,
}

fn bench_decode_route(c: &mut Criterion) {
    let input = get()
        .and(path("items"))
        .and(path_param::<u64>("id"))
        .and(query_opt::<String>("sort"))
        .and(query_list::<String>("tag"))
        .and(header_opt::<String>("x-request-id"));

    c.bench_function("decode_and_assemble_route", |b| {
        b.iter(|| {
            let mut req = SimpleRequest::get("/items/42?sort=asc&tag=a&tag=b").header("x-request-id", "abc");
            black_box(input.decode_and_assemble(&mut req).unwrap());
        });
    });

    c.bench_function("decode_route_mismatch", |b| {
        b.iter(|| {
            let mut req = SimpleRequest::get("/users/42");
            black_box(input.decode(&mut req).unwrap());
        });
    });
}

fn bench_json_body(c: &mut Criterion) {
    let input = post().and(path("items")).and(json_body::<Item>());
    let body = Bytes::from_static(br#"{"id":7,"name":"pen","tags":["office","blue"]}"#);

    c.bench_function("decode_json_body", |b| {
        b.iter(|| {
            let mut req = SimpleRequest::post("/items").body(body.clone());
            black_box(input.decode_and_assemble(&mut req).unwrap());
        });
    });
}

fn bench_encode(c: &mut Criterion) {
    let output = text_body::<u64>().and(header_opt::<String>("etag"));

    c.bench_function("encode_text_body", |b| {
        b.iter(|| black_box(output.encode((42, Some("v1".to_string()))).unwrap()));
    });
}

criterion_group!(benches, bench_decode_route, bench_json_body, bench_encode);
criterion_main!(benches);

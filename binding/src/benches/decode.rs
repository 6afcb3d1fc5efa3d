use super::{method, request};
use commonware_binding::JsonCodec;
use criterion::{criterion_group, Criterion};
use std::hint::black_box;

fn bench_decode(c: &mut Criterion) {
    let method = method();
    let codec = JsonCodec::default();
    for ids in [0, 16, 256] {
        let request = request(ids);
        c.bench_function(&format!("{}/ids={}", module_path!(), ids), |b| {
            b.iter(|| {
                let payload = method.decode_request(black_box(&request), &codec);
                black_box(payload.unwrap());
            });
        });
    }
}

criterion_group!(benches, bench_decode);

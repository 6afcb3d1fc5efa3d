use super::{method, request};
use commonware_binding::{JsonCodec, Value};
use criterion::{criterion_group, Criterion};
use std::hint::black_box;

fn bench_encode(c: &mut Criterion) {
    let method = method();
    let codec = JsonCodec::default();
    let request = request(0);
    for outcome in ["created", "other"] {
        let result = Value::object([
            ("outcome", Value::from(outcome)),
            ("id", Value::UInt(7)),
            ("tags", Value::from(vec!["a"; 32])),
        ]);
        c.bench_function(&format!("{}/outcome={}", module_path!(), outcome), |b| {
            b.iter(|| {
                let response = method.encode_response(&request, black_box(&result), &codec);
                black_box(response.unwrap());
            });
        });
    }
}

criterion_group!(benches, bench_encode);

//! # Verified-SMS Proxy Benchmarks
//!
//! Per-message costs on the dispatch path:
//!
//! | Stage | Work per recipient / message |
//! |-------|------------------------------|
//! | vp-01 sanitizer | one pass over the text plus URL scan |
//! | vp-01 hash generation | ECDH (P-384) + up to two HKDF-SHA256 expansions |
//! | vp-02 segmentation | one pass, UDH per part |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use vp_01_text_hashing::{AgentKeyPair, TextSanitizer, VerificationHashGenerator};
use vp_02_segmentation::MessageSegmenter;

const SHORT: &str = "Your verification code is 482913. Don't share it.";
const WITH_URL: &str = "Café Olé: your order #5521 ships today! Track at https://Example.com/Track?id=5521 – thanks";

fn bench_sanitizer(c: &mut Criterion) {
    let sanitizer = TextSanitizer::new();
    let mut group = c.benchmark_group("vp-01-sanitizer");

    group.bench_function("plain_ascii", |b| {
        b.iter(|| black_box(sanitizer.sanitize(black_box(SHORT))))
    });
    group.bench_function("accents_and_url", |b| {
        b.iter(|| black_box(sanitizer.sanitize(black_box(WITH_URL))))
    });

    let long = WITH_URL.repeat(20);
    group.throughput(Throughput::Bytes(long.len() as u64));
    group.bench_function("long_message", |b| {
        b.iter(|| black_box(sanitizer.sanitize(black_box(&long))))
    });
    group.finish();
}

fn bench_hash_generation(c: &mut Criterion) {
    let generator = VerificationHashGenerator::new();
    let agent = AgentKeyPair::generate().unwrap();
    let mut group = c.benchmark_group("vp-01-hash-generation");
    group.measurement_time(Duration::from_secs(10));

    let device = AgentKeyPair::generate().unwrap();
    group.bench_function("single_recipient", |b| {
        b.iter(|| {
            black_box(
                generator
                    .hash_codes(agent.private_der(), device.public_der(), black_box(WITH_URL))
                    .unwrap(),
            )
        })
    });

    for recipients in [1usize, 10, 50] {
        let devices: Vec<_> = (0..recipients)
            .map(|_| AgentKeyPair::generate().unwrap())
            .collect();
        group.throughput(Throughput::Elements(recipients as u64));
        group.bench_with_input(
            BenchmarkId::new("recipients", recipients),
            &devices,
            |b, devices| {
                b.iter(|| {
                    for device in devices {
                        black_box(
                            generator
                                .hash_codes(agent.private_der(), device.public_der(), SHORT)
                                .unwrap(),
                        );
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_segmentation(c: &mut Criterion) {
    let segmenter = MessageSegmenter::new();
    let mut group = c.benchmark_group("vp-02-segmentation");

    for (name, text) in [
        ("gsm7_400", "a".repeat(400)),
        ("ucs2_400", "ж".repeat(400)),
        ("gsm7_extended_400", "[]".repeat(200)),
    ] {
        group.bench_with_input(BenchmarkId::new("split", name), &text, |b, text| {
            b.iter(|| black_box(segmenter.split_with_reference(black_box(text), 0x42).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sanitizer,
    bench_hash_generation,
    bench_segmentation
);
criterion_main!(benches);

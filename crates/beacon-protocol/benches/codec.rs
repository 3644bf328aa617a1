//! Codec benchmarks for beacon-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use beacon_protocol::{codec, Frame, IceCandidate, SessionDescription};

// A realistic audio+video offer body is a few KB.
fn sample_sdp(size: usize) -> String {
    "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n"
        .chars()
        .cycle()
        .take(size)
        .collect()
}

fn bench_encode_offer(c: &mut Criterion) {
    let frame = Frame::offer("abc12", SessionDescription::offer(sample_sdp(4096)));

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(4096));
    group.bench_function("offer_4KB", |b| b.iter(|| codec::encode(black_box(&frame))));
    group.finish();
}

fn bench_decode_offer(c: &mut Criterion) {
    let frame = Frame::offer("abc12", SessionDescription::offer(sample_sdp(4096)));
    let encoded = codec::encode(&frame).unwrap();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("offer_4KB", |b| {
        b.iter(|| codec::decode(black_box(&encoded)))
    });
    group.finish();
}

fn bench_roundtrip_candidate(c: &mut Criterion) {
    let frame = Frame::candidate(
        "abc12",
        IceCandidate::new("candidate:842163049 1 udp 1677729535 192.0.2.1 54400 typ srflx")
            .with_sdp_mid("0")
            .with_mline_index(0),
    );

    c.bench_function("roundtrip_candidate", |b| {
        b.iter(|| {
            let encoded = codec::encode(black_box(&frame)).unwrap();
            codec::decode(black_box(&encoded)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_encode_offer,
    bench_decode_offer,
    bench_roundtrip_candidate
);
criterion_main!(benches);

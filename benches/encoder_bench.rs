//! Performance benchmarks for the credential encoder.
//!
//! The endpoint seals one credential per card presentation; these benchmarks
//! check that sealing, IV generation and request framing stay far below the
//! human-scale latency of a door.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench encoder_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use doorgate_core::{DeviceId, EncryptionKey};
use doorgate_protocol::{
    AuthorizationPayload, AuthorizationRequest, CredentialEncoder, ExchangeCodec, IvSource,
    OsIvSource, ReseedingIvSource, encrypt_block,
};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

fn bench_key() -> EncryptionKey {
    EncryptionKey::new([0x2b; 16])
}

/// Benchmark single-block encryption for typical UID lengths.
fn bench_encrypt_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt_block");
    group.throughput(Throughput::Elements(1));

    let key = bench_key();
    let iv = [0u8; 16];

    for len in [4usize, 7, 10, 15] {
        let credential = vec![0xA5; len];
        group.bench_with_input(BenchmarkId::from_parameter(len), &credential, |b, cred| {
            b.iter(|| black_box(encrypt_block(&key, &iv, black_box(cred)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark the IV sources.
fn bench_iv_sources(c: &mut Criterion) {
    let mut group = c.benchmark_group("iv_source");
    group.throughput(Throughput::Elements(1));

    group.bench_function("os", |b| {
        let mut source = OsIvSource;
        b.iter(|| black_box(source.next_iv().unwrap()));
    });

    group.bench_function("reseeding_chacha", |b| {
        let mut source = ReseedingIvSource::new().unwrap();
        b.iter(|| black_box(source.next_iv().unwrap()));
    });

    group.finish();
}

/// Benchmark sealing plus request framing, as done per card presentation.
fn bench_seal_and_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal_and_frame");
    group.throughput(Throughput::Elements(1));

    let device = DeviceId::generate();
    let mut encoder = CredentialEncoder::new(bench_key(), OsIvSource);

    group.bench_function("uid_7_bytes", |b| {
        b.iter(|| {
            let sealed = encoder.seal(black_box(&[0x04, 0xAB, 0xCD, 0xEF, 0x01, 0x02, 0x03])).unwrap();
            let payload = AuthorizationPayload::new(&device, &sealed);
            let request = AuthorizationRequest::new("auth.local:8080", &payload).unwrap();

            let mut codec = ExchangeCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(request, &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark response head decoding.
fn bench_decode_head(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_head");
    group.throughput(Throughput::Elements(1));

    let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nAlice";

    group.bench_function("granted", |b| {
        b.iter(|| {
            let mut codec = ExchangeCodec::new();
            let mut buffer = BytesMut::from(&raw[..]);
            black_box(codec.decode(&mut buffer).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encrypt_block,
    bench_iv_sources,
    bench_seal_and_frame,
    bench_decode_head,
);

criterion_main!(benches);

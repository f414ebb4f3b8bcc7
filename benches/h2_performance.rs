//! HTTP/2 Performance Benchmarks
//!
//! This benchmark suite measures:
//! - Frame header encoding/decoding
//! - DATA frame encoding and decoding at various sizes
//! - HPACK header compression/decompression
//! - Flow control window accounting
//! - Body fragmentation through a stream
//!
//! Run with: cargo bench --bench h2_performance

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use h2mux::h2::{
    codec::{FrameCodec, FRAME_HEADER_SIZE},
    flow_control::{FlowControlWindow, WindowManager},
    frames::{DataFrame, Frame, FrameFlags, FrameType, SettingsFrame},
    hpack::HeaderCodec,
    settings::SettingsBuilder,
    stream::{FrameSink, H2Stream},
    DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_FRAME_SIZE, MAX_WINDOW_SIZE,
};
use h2mux::Result;
use std::time::Duration;

/// Sink that only counts encoded bytes
#[derive(Default)]
struct CountingSink {
    bytes: usize,
}

impl FrameSink for CountingSink {
    fn send_frame(&mut self, frame: Frame) -> Result<()> {
        self.bytes += frame.serialize().len();
        Ok(())
    }
}

fn request_headers() -> Vec<(String, String)> {
    [
        (":method", "GET"),
        (":scheme", "https"),
        (":authority", "www.example.com"),
        (":path", "/assets/app.js"),
        ("user-agent", "h2mux-bench/0.1"),
        ("accept", "*/*"),
        ("accept-encoding", "gzip, deflate, br"),
        ("cookie", "session=0123456789abcdef; theme=dark"),
    ]
    .iter()
    .map(|(n, v)| (n.to_string(), v.to_string()))
    .collect()
}

// ========== Frame Encoding/Decoding Benchmarks ==========

fn bench_frame_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_header");

    group.bench_function("encode", |b| {
        b.iter(|| {
            black_box(FrameCodec::encode_header(
                black_box(FrameType::Data.as_u8()),
                black_box(FrameFlags::from_u8(FrameFlags::END_STREAM)),
                black_box(1),
                black_box(1024),
            ))
        });
    });

    let header = FrameCodec::encode_header(FrameType::Headers.as_u8(), FrameFlags::from_u8(0x05), 3, 4096);
    group.bench_function("decode", |b| {
        b.iter(|| black_box(FrameCodec::decode_header(black_box(&header))));
    });

    group.finish();
}

fn bench_data_frame_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_frame");

    for size in [64usize, 1024, 16384].iter() {
        let frame = Frame::from(DataFrame::new(1, Bytes::from(vec![0u8; *size]), false));
        let encoded = FrameCodec::encode_frame(&frame);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), size, |b, _| {
            b.iter(|| black_box(FrameCodec::encode_frame(black_box(&frame))));
        });

        let mut header = [0u8; FRAME_HEADER_SIZE];
        header.copy_from_slice(&encoded[..FRAME_HEADER_SIZE]);
        let payload = encoded.slice(FRAME_HEADER_SIZE..);
        group.bench_with_input(BenchmarkId::new("decode", size), size, |b, _| {
            b.iter(|| {
                let header = FrameCodec::decode_header(&header);
                black_box(FrameCodec::decode_frame(header, payload.clone()).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_settings_frame(c: &mut Criterion) {
    let settings = SettingsBuilder::new()
        .enable_push(false)
        .initial_window_size(1 << 20)
        .max_frame_size(DEFAULT_MAX_FRAME_SIZE)
        .max_concurrent_streams(100)
        .build()
        .unwrap();
    let frame = Frame::from(SettingsFrame::new(settings));

    c.bench_function("settings_frame_roundtrip", |b| {
        b.iter(|| {
            let mut reader = &FrameCodec::encode_frame(black_box(&frame))[..];
            black_box(FrameCodec::read_frame(&mut reader).unwrap())
        });
    });
}

// ========== HPACK Benchmarks ==========

fn bench_hpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("hpack");
    let headers = request_headers();

    group.bench_function("encode_fresh", |b| {
        b.iter(|| {
            let mut codec = HeaderCodec::new();
            black_box(codec.encode(black_box(&headers)).unwrap())
        });
    });

    group.bench_function("encode_indexed", |b| {
        let mut codec = HeaderCodec::new();
        codec.encode(&headers).unwrap();
        b.iter(|| black_box(codec.encode(black_box(&headers)).unwrap()));
    });

    group.bench_function("encode_literal_only", |b| {
        let mut codec = HeaderCodec::new();
        codec.set_header_table_size(0);
        b.iter(|| black_box(codec.encode(black_box(&headers)).unwrap()));
    });

    let block = HeaderCodec::new().encode(&headers).unwrap();
    group.bench_function("decode_fresh", |b| {
        b.iter(|| {
            let mut codec = HeaderCodec::new();
            black_box(codec.decode(black_box(&block)).unwrap())
        });
    });

    group.finish();
}

// ========== Flow Control Benchmarks ==========

fn bench_flow_control(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_control");

    group.bench_function("send_window_consume_increase", |b| {
        let mut window = FlowControlWindow::new();
        b.iter(|| {
            window.consume(black_box(1024)).unwrap();
            window.increase(black_box(1024)).unwrap();
        });
    });

    group.bench_function("window_manager_receive", |b| {
        let mut manager = WindowManager::new(DEFAULT_INITIAL_WINDOW_SIZE);
        b.iter(|| black_box(manager.handle_received_frame(black_box(16384))));
    });

    group.bench_function("window_manager_large_window", |b| {
        let mut manager = WindowManager::new(MAX_WINDOW_SIZE);
        b.iter(|| black_box(manager.handle_received_frame(black_box(16384))));
    });

    group.finish();
}

// ========== Large Transfer Benchmarks ==========

fn bench_body_fragmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("body_fragmentation");
    let mut codec = HeaderCodec::new();

    for body_size in [64 * 1024usize, 1024 * 1024].iter() {
        let body = Bytes::from(vec![0u8; *body_size]);
        group.throughput(Throughput::Bytes(*body_size as u64));
        group.bench_with_input(
            BenchmarkId::new("send_data", format!("{}KB", body_size / 1024)),
            body_size,
            |b, _| {
                b.iter(|| {
                    let mut sink = CountingSink::default();
                    let mut stream = H2Stream::new(1, MAX_WINDOW_SIZE, DEFAULT_INITIAL_WINDOW_SIZE);
                    stream
                        .open(false, &mut codec, DEFAULT_MAX_FRAME_SIZE as usize, &mut sink)
                        .unwrap();
                    stream
                        .send_data(body.clone(), true, DEFAULT_MAX_FRAME_SIZE as usize, &mut sink)
                        .unwrap();
                    black_box(sink.bytes)
                });
            },
        );
    }

    group.finish();
}

criterion_group! {
    name = frame_encoding;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5));
    targets =
        bench_frame_header,
        bench_data_frame_sizes,
        bench_settings_frame
}

criterion_group! {
    name = hpack;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(500);
    targets = bench_hpack
}

criterion_group! {
    name = flow_control_benches;
    config = Criterion::default();
    targets = bench_flow_control
}

criterion_group! {
    name = large_transfers;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(20);
    targets = bench_body_fragmentation
}

criterion_main!(frame_encoding, hpack, flow_control_benches, large_transfers);

//! Criterion benchmarks for echoline-core frame processing
//!
//! Run with: cargo bench -p echoline-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use echoline_core::{Echo, EchoLine, FrameEffect, SignalBuffer, decode_i16_le, encode_i16_le};

const SAMPLE_RATE: f64 = 8000.0;
const FRAME_SIZES: &[usize] = &[256, 512, 1024, 4096];

fn generate_test_frame(size: usize) -> SignalBuffer {
    let mut frame = SignalBuffer::new(size).expect("non-zero frame size");
    for (i, sample) in frame.samples_mut().iter_mut().enumerate() {
        let t = i as f64 / SAMPLE_RATE;
        *sample = (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5;
    }
    frame
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pcm");

    for &frame_size in FRAME_SIZES {
        let frame = generate_test_frame(frame_size);
        let mut bytes = vec![0u8; frame_size * 2];
        let mut samples = vec![0.0; frame_size];

        group.bench_with_input(BenchmarkId::new("encode", frame_size), &frame_size, |b, _| {
            b.iter(|| encode_i16_le(black_box(frame.samples()), &mut bytes));
        });

        group.bench_with_input(BenchmarkId::new("decode", frame_size), &frame_size, |b, _| {
            b.iter(|| decode_i16_le(black_box(&bytes), &mut samples));
        });
    }

    group.finish();
}

fn bench_echo(c: &mut Criterion) {
    let mut group = c.benchmark_group("Echo");

    for &frame_size in FRAME_SIZES {
        let input = generate_test_frame(frame_size);
        let mut output = SignalBuffer::new(frame_size).expect("non-zero frame size");

        group.bench_with_input(BenchmarkId::new("frame_local", frame_size), &frame_size, |b, _| {
            let mut echo = Echo::new(200, 0.5);
            b.iter(|| echo.apply(black_box(&input), &mut output));
        });

        group.bench_with_input(BenchmarkId::new("delay_line", frame_size), &frame_size, |b, _| {
            let mut echo = EchoLine::new(2000, 0.5);
            b.iter(|| echo.apply(black_box(&input), &mut output));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_echo);
criterion_main!(benches);

//! Kernel render benchmarks
//!
//! Measures the full per-block cost of the compressor kernel.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vx1_core::{AudioProcessor, ChannelConfig, DetectorLink, Kernel, ParamId, ProcessContext};

fn stereo_block(frames: usize) -> (Vec<f32>, Vec<f32>) {
    let left = (0..frames).map(|i| (i as f32 * 0.01).sin() * 0.8).collect();
    let right = (0..frames).map(|i| (i as f32 * 0.013).sin() * 0.6).collect();
    (left, right)
}

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_render");

    // Typical host block sizes
    for frames in [64, 128, 256, 512, 1024] {
        let mut kernel = Kernel::new(DetectorLink::LinkedMax);
        kernel
            .prepare(&ChannelConfig::new(48000, 2, frames as u32))
            .unwrap();
        let (left, right) = stereo_block(frames);
        let mut out_l = vec![0.0_f32; frames];
        let mut out_r = vec![0.0_f32; frames];

        group.throughput(Throughput::Elements(frames as u64 * 2));
        group.bench_function(format!("render_{}_frames", frames), |b| {
            b.iter(|| {
                let inputs: [&[f32]; 2] = [black_box(&left), black_box(&right)];
                kernel
                    .render(&inputs, &mut [&mut out_l, &mut out_r], frames)
                    .unwrap();
            })
        });
    }

    group.finish();
}

fn benchmark_full_character(c: &mut Criterion) {
    let frames = 512;
    let mut kernel = Kernel::new(DetectorLink::Independent);
    let params = kernel.params();
    params.set(ParamId::Detection, 50.0);
    params.set(ParamId::LookAhead, 5.0);
    params.set(ParamId::Speed, 60.0);
    params.set(ParamId::Grip, 40.0);
    params.set(ParamId::Stack, 50.0);
    params.set(ParamId::Sheen, 30.0);
    params.set(ParamId::AutoMakeup, 1.0);
    kernel
        .prepare(&ChannelConfig::new(48000, 2, frames as u32))
        .unwrap();

    let (left, right) = stereo_block(frames);
    let mut buffer: Vec<f32> = left.iter().zip(&right).flat_map(|(&l, &r)| [l, r]).collect();
    let context = ProcessContext::new(48000.0, 2, frames);

    c.bench_function("process_512_frames_all_stages", |b| {
        b.iter(|| {
            kernel.process(black_box(&mut buffer), &context);
        })
    });
}

fn benchmark_bypass(c: &mut Criterion) {
    let frames = 512;
    let mut kernel = Kernel::new(DetectorLink::LinkedMax);
    kernel.params().set(ParamId::Bypass, 1.0);
    kernel
        .prepare(&ChannelConfig::new(48000, 2, frames as u32))
        .unwrap();
    let (left, right) = stereo_block(frames);
    let mut out_l = vec![0.0_f32; frames];
    let mut out_r = vec![0.0_f32; frames];

    c.bench_function("render_512_frames_bypassed", |b| {
        b.iter(|| {
            kernel
                .render(&[&left, &right], &mut [&mut out_l, &mut out_r], frames)
                .unwrap();
        })
    });
}

criterion_group!(benches, benchmark_render, benchmark_full_character, benchmark_bypass);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lpcnet_features::internals::{normalized_xcorr, xcorr_kernel, KissFft};
use lpcnet_features::{LPCNetEncState, FRAME_SIZE};
use num_complex::Complex32;

fn generate_signal(len: usize, seed: u32) -> Vec<f32> {
    let mut v = Vec::with_capacity(len);
    let mut state = seed;
    for _ in 0..len {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        v.push((state as i32 >> 16) as f32 / 32768.0);
    }
    v
}

fn bench_xcorr_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("xcorr_kernel");
    for &n in &[80, 160] {
        let x = generate_signal(n, 42);
        let y = generate_signal(n + 3, 123);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut sum = [0.0f32; 4];
                xcorr_kernel(&x[..n], &y, &mut sum, n);
                black_box(sum)
            })
        });
    }
    group.finish();
}

fn bench_normalized_xcorr(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalized_xcorr");
    for &(len, lags) in &[(80usize, 256usize), (160, 224)] {
        let reference = generate_signal(len + lags, 7);
        let probe = reference[lags..].to_vec();
        group.bench_with_input(
            BenchmarkId::new("len", len),
            &(len, lags),
            |b, &(len, lags)| {
                let mut out = vec![0.0f32; lags];
                let mut scratch = vec![0.0f32; lags];
                b.iter(|| {
                    black_box(normalized_xcorr(
                        &probe,
                        &reference,
                        &mut out,
                        &mut scratch,
                        len,
                    ))
                })
            },
        );
    }
    group.finish();
}

fn bench_fft(c: &mut Criterion) {
    let fft = match KissFft::new(320) {
        Some(fft) => fft,
        None => return,
    };
    let re = generate_signal(320, 9);
    let input: Vec<Complex32> = re.iter().map(|&v| Complex32::new(v, 0.0)).collect();
    let mut output = vec![Complex32::new(0.0, 0.0); 320];
    c.bench_function("kiss_fft_320", |b| {
        b.iter(|| {
            fft.process(black_box(&input), &mut output);
            black_box(output[1])
        })
    });
}

fn bench_frame_features(c: &mut Criterion) {
    let pcm: Vec<i16> = generate_signal(100 * FRAME_SIZE, 1)
        .into_iter()
        .map(|v| (v * 12000.0) as i16)
        .collect();
    c.bench_function("compute_single_frame_features", |b| {
        let mut enc = LPCNetEncState::new();
        let mut frames = pcm.chunks_exact(FRAME_SIZE).cycle();
        b.iter(|| {
            let frame = frames.next().unwrap_or(&[0; FRAME_SIZE]);
            black_box(enc.compute_single_frame_features(frame))
        })
    });
}

criterion_group!(
    benches,
    bench_xcorr_kernel,
    bench_normalized_xcorr,
    bench_fft,
    bench_frame_features
);
criterion_main!(benches);

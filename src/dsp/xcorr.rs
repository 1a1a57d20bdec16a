//! Cross-correlation and energy-normalized lag curves.

use itertools::izip;

/// Inner product of the first `n` samples of `x` and `y`.
#[inline]
pub fn inner_prod(x: &[f32], y: &[f32], n: usize) -> f32 {
    x[..n].iter().zip(&y[..n]).map(|(a, b)| a * b).sum()
}

/// Four consecutive lags at once.
///
/// `y` must hold at least `len + 3` samples; results accumulate into `sum`.
#[inline]
pub fn xcorr_kernel(x: &[f32], y: &[f32], sum: &mut [f32; 4], len: usize) {
    for (k, &xk) in x[..len].iter().enumerate() {
        let y4 = &y[k..k + 4];
        sum[0] += xk * y4[0];
        sum[1] += xk * y4[1];
        sum[2] += xk * y4[2];
        sum[3] += xk * y4[3];
    }
}

/// Raw cross-correlation `xcorr[i] = sum_k x[k] * y[i + k]` for
/// `i in 0..xcorr.len()`.
///
/// `x` must hold `len` samples and `y` at least `len + xcorr.len() - 1`.
pub fn pitch_xcorr(x: &[f32], y: &[f32], xcorr: &mut [f32], len: usize) {
    let max_pitch = xcorr.len();
    assert!(max_pitch > 0);
    let mut i = 0;
    while i + 4 <= max_pitch {
        let mut sum = [0.0f32; 4];
        xcorr_kernel(x, &y[i..], &mut sum, len);
        xcorr[i..i + 4].copy_from_slice(&sum);
        i += 4;
    }
    while i < max_pitch {
        xcorr[i] = inner_prod(x, &y[i..], len);
        i += 1;
    }
}

/// Energy-normalized correlation curve of `probe` against `reference`.
///
/// For each lag index `i` the reference window is `reference[i..i + len]`
/// and the result is `2 * xcorr[i] / (1 + E_probe + E_ref[i])`. `E_ref`
/// slides along the reference as a running sum, adding the sample that enters
/// the window and removing the one that leaves, so the whole curve costs
/// one correlation pass plus O(1) per lag.
///
/// `scratch` receives the raw correlation and must be at least `out.len()`
/// long. Returns the probe energy.
pub fn normalized_xcorr(
    probe: &[f32],
    reference: &[f32],
    out: &mut [f32],
    scratch: &mut [f32],
    len: usize,
) -> f32 {
    let lags = out.len();
    assert!(len > 0);
    assert!(reference.len() + 1 >= len + lags);
    let xcorr = &mut scratch[..lags];
    pitch_xcorr(&probe[..len], reference, xcorr, len);

    let ener0 = inner_prod(probe, probe, len);
    let mut ener1 = reference[..len - 1]
        .iter()
        .map(|&v| v as f64 * v as f64)
        .sum::<f64>();
    for (i, (o, &xc)) in izip!(out.iter_mut(), xcorr.iter()).enumerate() {
        let entering = reference[i + len - 1] as f64;
        ener1 += entering * entering;
        let ener = 1.0 + ener0 as f64 + ener1;
        *o = (2.0 * xc as f64 / ener) as f32;
        let leaving = reference[i] as f64;
        ener1 -= leaving * leaving;
    }
    ener0
}

//! Small stateful filters used ahead of and inside the residual path.

/// First-order pre-emphasis `y[n] = x[n] - coef * x[n-1]`, in place.
pub fn preemphasis(x: &mut [f32], mem: &mut f32, coef: f32) {
    for xi in x.iter_mut() {
        let yi = *xi + *mem;
        *mem = -coef * *xi;
        *xi = yi;
    }
}

/// Second-order IIR section in transposed direct form, in place.
///
/// The leading numerator tap is fixed to 1; `b` and `a` hold the remaining
/// two taps. State products run in double precision.
pub fn biquad(x: &mut [f32], mem: &mut [f32; 2], b: &[f32; 2], a: &[f32; 2]) {
    for xi in x.iter_mut() {
        let x0 = *xi as f64;
        let yi = *xi + mem[0];
        let y0 = yi as f64;
        mem[0] = (mem[1] as f64 + (b[0] as f64 * x0 - a[0] as f64 * y0)) as f32;
        mem[1] = (b[1] as f64 * x0 - a[1] as f64 * y0) as f32;
        *xi = yi;
    }
}

/// 8-bit u-law companding of a 16-bit-scale sample.
pub fn lin2ulaw(x: f32) -> u8 {
    const SCALE: f32 = 255.0;
    const LOG256: f32 = 5.545_177_4;
    let s = if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    };
    let u = s * (128.0 * (1.0 + SCALE * x.abs() / 32768.0).ln() / LOG256);
    (128.0 + u).clamp(0.0, 255.0).round() as u8
}

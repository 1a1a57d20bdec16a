//! Frequency-domain analysis: windowing, band energies, DCT and the
//! cepstrum-to-LPC conversion.
//!
//! All tables are derived once per [`FreqTables`] and shared through the
//! encoder context; none of the functions here keep state between calls.

use num_complex::Complex32;
use num_traits::Zero;

use super::{FREQ_SIZE, LPC_ORDER, NB_BANDS, OVERLAP_SIZE, WINDOW_SIZE};
use crate::dsp::kiss_fft::KissFft;

/// Spectral bins per 5 ms band-edge unit.
const WINDOW_SIZE_5MS: usize = 4;

/// Band edges in 5 ms units.
static EBAND5MS: [usize; NB_BANDS] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 20, 24, 28, 34, 40,
];

/// Per-band gain compensation applied when rebuilding a spectrum from
/// cepstral coefficients.
static COMPENSATION: [f32; NB_BANDS] = [
    0.8, 1., 1., 1., 1., 1., 1., 1., 0.666667, 0.5, 0.5, 0.5, 0.333333, 0.25, 0.25, 0.2, 0.166667,
    0.173913,
];

/// FFT plan, analysis window and DCT basis for one stream.
#[derive(Clone, Debug)]
pub struct FreqTables {
    fft: KissFft,
    half_window: [f32; OVERLAP_SIZE],
    dct_table: [f32; NB_BANDS * NB_BANDS],
}

impl Default for FreqTables {
    fn default() -> Self {
        Self::new()
    }
}

impl FreqTables {
    pub fn new() -> Self {
        let fft = match KissFft::new(WINDOW_SIZE) {
            Some(fft) => fft,
            None => unreachable!("WINDOW_SIZE factors into radices 4 and 5"),
        };

        let mut half_window = [0.0f32; OVERLAP_SIZE];
        for (i, w) in half_window.iter_mut().enumerate() {
            let s = (0.5 * std::f64::consts::PI * (i as f64 + 0.5) / OVERLAP_SIZE as f64).sin();
            *w = (0.5 * std::f64::consts::PI * s * s).sin() as f32;
        }

        let mut dct_table = [0.0f32; NB_BANDS * NB_BANDS];
        for i in 0..NB_BANDS {
            for j in 0..NB_BANDS {
                let mut v = ((i as f64 + 0.5) * j as f64 * std::f64::consts::PI / NB_BANDS as f64).cos();
                if j == 0 {
                    v *= 0.5f64.sqrt();
                }
                dct_table[i * NB_BANDS + j] = v as f32;
            }
        }

        FreqTables {
            fft,
            half_window,
            dct_table,
        }
    }

    /// Apply the power-complementary analysis window to both ends of `x`.
    pub fn apply_window(&self, x: &mut [f32; WINDOW_SIZE]) {
        for (i, &w) in self.half_window.iter().enumerate() {
            x[i] *= w;
            x[WINDOW_SIZE - 1 - i] *= w;
        }
    }

    /// Real input of `WINDOW_SIZE` samples to the lower `FREQ_SIZE` bins.
    pub fn forward_transform(&self, out: &mut [Complex32; FREQ_SIZE], input: &[f32; WINDOW_SIZE]) {
        let mut x = [Complex32::zero(); WINDOW_SIZE];
        for (c, &v) in x.iter_mut().zip(input.iter()) {
            c.re = v;
        }
        let mut y = [Complex32::zero(); WINDOW_SIZE];
        self.fft.process(&x, &mut y);
        out.copy_from_slice(&y[..FREQ_SIZE]);
    }

    /// Hermitian-extend `FREQ_SIZE` bins and transform back to time domain.
    pub fn inverse_transform(&self, out: &mut [f32; WINDOW_SIZE], input: &[Complex32; FREQ_SIZE]) {
        let mut x = [Complex32::zero(); WINDOW_SIZE];
        x[..FREQ_SIZE].copy_from_slice(input);
        for i in FREQ_SIZE..WINDOW_SIZE {
            x[i] = x[WINDOW_SIZE - i].conj();
        }
        let mut y = [Complex32::zero(); WINDOW_SIZE];
        self.fft.process(&x, &mut y);
        // A forward transform read backwards is the inverse.
        out[0] = WINDOW_SIZE as f32 * y[0].re;
        for i in 1..WINDOW_SIZE {
            out[i] = WINDOW_SIZE as f32 * y[WINDOW_SIZE - i].re;
        }
    }

    /// Orthonormal type-II DCT over `NB_BANDS` values.
    pub fn dct(&self, out: &mut [f32], input: &[f32; NB_BANDS]) {
        let scale = (2.0f64 / NB_BANDS as f64).sqrt();
        for (i, o) in out[..NB_BANDS].iter_mut().enumerate() {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(j, &v)| v * self.dct_table[j * NB_BANDS + i])
                .sum();
            *o = (sum as f64 * scale) as f32;
        }
    }

    /// Inverse of [`dct`](Self::dct).
    pub fn idct(&self, out: &mut [f32; NB_BANDS], input: &[f32]) {
        let scale = (2.0f64 / NB_BANDS as f64).sqrt();
        for (i, o) in out.iter_mut().enumerate() {
            let sum: f32 = input[..NB_BANDS]
                .iter()
                .enumerate()
                .map(|(j, &v)| v * self.dct_table[i * NB_BANDS + j])
                .sum();
            *o = (sum as f64 * scale) as f32;
        }
    }

    /// LPC coefficients for the spectral envelope described by `cepstrum`.
    ///
    /// Returns the Levinson-Durbin prediction error.
    pub fn lpc_from_cepstrum(&self, lpc: &mut [f32; LPC_ORDER], cepstrum: &[f32]) -> f32 {
        let mut tmp = [0.0f32; NB_BANDS];
        tmp.copy_from_slice(&cepstrum[..NB_BANDS]);
        tmp[0] += 4.0;
        let mut ex = [0.0f32; NB_BANDS];
        self.idct(&mut ex, &tmp);
        for (e, &c) in ex.iter_mut().zip(COMPENSATION.iter()) {
            *e = 10.0f32.powf(*e) * c;
        }
        self.lpc_from_bands(lpc, &ex)
    }

    fn lpc_from_bands(&self, lpc: &mut [f32; LPC_ORDER], ex: &[f32; NB_BANDS]) -> f32 {
        let mut xr = [0.0f32; FREQ_SIZE];
        interp_band_gain(&mut xr, ex);
        xr[FREQ_SIZE - 1] = 0.0;
        let mut x_auto = [Complex32::zero(); FREQ_SIZE];
        for (x, &r) in x_auto.iter_mut().zip(xr.iter()) {
            x.re = r;
        }
        let mut autocorr = [0.0f32; WINDOW_SIZE];
        self.inverse_transform(&mut autocorr, &x_auto);

        let mut ac = [0.0f32; LPC_ORDER + 1];
        ac.copy_from_slice(&autocorr[..LPC_ORDER + 1]);
        // -40 dB noise floor; the integer division is part of the tuning.
        ac[0] += ac[0] * 1e-4 + (320 / 12) as f32 / 38.0;
        for (i, a) in ac.iter_mut().enumerate().skip(1) {
            *a *= 1.0 - 6e-5 * (i * i) as f32;
        }
        let mut rc = [0.0f32; LPC_ORDER];
        levinson_durbin(lpc, &mut rc, &ac)
    }
}

/// Triangular band energies of a spectrum; edge bands are doubled.
pub fn compute_band_energy(band_e: &mut [f32; NB_BANDS], x: &[Complex32; FREQ_SIZE]) {
    let mut sum = [0.0f32; NB_BANDS];
    for i in 0..NB_BANDS - 1 {
        let band_size = (EBAND5MS[i + 1] - EBAND5MS[i]) * WINDOW_SIZE_5MS;
        for j in 0..band_size {
            let frac = j as f32 / band_size as f32;
            let tmp = x[EBAND5MS[i] * WINDOW_SIZE_5MS + j].norm_sqr();
            sum[i] += (1.0 - frac) * tmp;
            sum[i + 1] += frac * tmp;
        }
    }
    sum[0] *= 2.0;
    sum[NB_BANDS - 1] *= 2.0;
    *band_e = sum;
}

/// Linear interpolation of band values onto spectral bins.
pub fn interp_band_gain(g: &mut [f32; FREQ_SIZE], band_e: &[f32; NB_BANDS]) {
    g.fill(0.0);
    for i in 0..NB_BANDS - 1 {
        let band_size = (EBAND5MS[i + 1] - EBAND5MS[i]) * WINDOW_SIZE_5MS;
        for j in 0..band_size {
            let frac = j as f32 / band_size as f32;
            g[EBAND5MS[i] * WINDOW_SIZE_5MS + j] = (1.0 - frac) * band_e[i] + frac * band_e[i + 1];
        }
    }
}

/// Levinson-Durbin recursion from autocorrelation `ac[0..=order]`.
///
/// Stops early once the prediction gain reaches 30 dB. Returns the
/// residual error.
pub fn levinson_durbin(lpc: &mut [f32], rc: &mut [f32], ac: &[f32]) -> f32 {
    let p = lpc.len();
    lpc.fill(0.0);
    rc[..p].fill(0.0);
    let mut error = ac[0];
    if ac[0] == 0.0 {
        return error;
    }
    for i in 0..p {
        let mut rr: f32 = (0..i).map(|j| lpc[j] * ac[i - j]).sum();
        rr += ac[i + 1];
        let r = -rr / error;
        rc[i] = r;
        lpc[i] = r;
        for j in 0..(i + 1) >> 1 {
            let tmp1 = lpc[j];
            let tmp2 = lpc[i - 1 - j];
            lpc[j] = tmp1 + r * tmp2;
            lpc[i - 1 - j] = tmp2 + r * tmp1;
        }
        error -= r * r * error;
        if error < 0.001 * ac[0] {
            break;
        }
    }
    error
}

/// Log band energies with the running floor and follow clamps applied.
///
/// The floor tracks the loudest band so far minus 8 (80 dB); the follow
/// clamp limits how fast the envelope may drop from one band to the next.
pub fn log_band_envelope(ex: &[f32; NB_BANDS]) -> [f32; NB_BANDS] {
    let mut ly = [0.0f32; NB_BANDS];
    let mut log_max: f32 = -2.0;
    let mut follow: f32 = -2.0;
    for (l, &e) in ly.iter_mut().zip(ex.iter()) {
        *l = (1e-2 + e).log10().max(log_max - 8.0).max(follow - 2.5);
        log_max = log_max.max(*l);
        follow = (follow - 2.5).max(*l);
    }
    ly
}

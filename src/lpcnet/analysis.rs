//! Per-frame spectral analysis.

use num_complex::Complex32;
use num_traits::Zero;

use super::freq::{compute_band_energy, log_band_envelope, FreqTables};
use super::{
    FRAME_SIZE, FREQ_SIZE, NB_BANDS, OVERLAP_SIZE, PITCH_IF_FEATURES, PITCH_IF_MAX_FREQ,
    WINDOW_SIZE,
};

/// Spectrum and band energies of one analysis window.
#[derive(Clone, Debug)]
pub struct FrameSpectrum {
    pub bins: [Complex32; FREQ_SIZE],
    pub band_energy: [f32; NB_BANDS],
}

/// Windowed-FFT front end with its overlap and phase memory.
#[derive(Clone, Debug)]
pub struct SpectralAnalyzer {
    tables: FreqTables,
    analysis_mem: [f32; OVERLAP_SIZE],
    prev_if: [Complex32; PITCH_IF_MAX_FREQ],
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer {
    pub fn new() -> Self {
        SpectralAnalyzer {
            tables: FreqTables::new(),
            analysis_mem: [0.0; OVERLAP_SIZE],
            prev_if: [Complex32::zero(); PITCH_IF_MAX_FREQ],
        }
    }

    /// Clear the overlap and phase memory; the tables are kept.
    pub fn reset(&mut self) {
        self.analysis_mem.fill(0.0);
        self.prev_if.fill(Complex32::zero());
    }

    pub fn tables(&self) -> &FreqTables {
        &self.tables
    }

    /// Last `n` samples of the stored overlap, i.e. the previous frame's tail.
    pub fn overlap_tail(&self, n: usize) -> &[f32] {
        &self.analysis_mem[OVERLAP_SIZE - n..]
    }

    /// Window the stored overlap plus `input`, transform it, and keep the
    /// tail of `input` as the next overlap.
    pub fn analyze(&mut self, input: &[f32; FRAME_SIZE]) -> FrameSpectrum {
        let mut x = [0.0f32; WINDOW_SIZE];
        x[..OVERLAP_SIZE].copy_from_slice(&self.analysis_mem);
        x[OVERLAP_SIZE..].copy_from_slice(input);
        self.analysis_mem
            .copy_from_slice(&input[FRAME_SIZE - OVERLAP_SIZE..]);
        self.tables.apply_window(&mut x);

        let mut bins = [Complex32::zero(); FREQ_SIZE];
        self.tables.forward_transform(&mut bins, &x);
        let mut band_energy = [0.0f32; NB_BANDS];
        compute_band_energy(&mut band_energy, &bins);
        FrameSpectrum { bins, band_energy }
    }

    /// Instantaneous-frequency features of the lowest bins.
    ///
    /// Bin 0 contributes its log power only. Every other bin contributes the
    /// unit phasor of `X[i] * conj(X_prev[i])` and its log power. The
    /// current bins become the reference for the next frame.
    pub fn instantaneous_frequency(
        &mut self,
        bins: &[Complex32; FREQ_SIZE],
        out: &mut [f32; PITCH_IF_FEATURES],
    ) {
        out[0] = log_power_feature(bins[0].re * bins[0].re);
        for i in 1..PITCH_IF_MAX_FREQ {
            let prod = bins[i] * self.prev_if[i].conj();
            let norm_1 = 1.0 / (1e-15 + prod.norm_sqr()).sqrt();
            out[3 * i - 2] = prod.re * norm_1;
            out[3 * i - 1] = prod.im * norm_1;
            out[3 * i] = log_power_feature(bins[i].norm_sqr());
        }
        self.prev_if.copy_from_slice(&bins[..PITCH_IF_MAX_FREQ]);
    }

    /// Cepstral coefficients of the band energies, written to `out[..NB_BANDS]`.
    pub fn cepstrum(&self, band_energy: &[f32; NB_BANDS], out: &mut [f32]) {
        let ly = log_band_envelope(band_energy);
        self.tables.dct(out, &ly);
        out[0] -= 4.0;
    }
}

/// Log power mapped to roughly [-1, 1] and clipped there.
fn log_power_feature(power: f32) -> f32 {
    ((1.0 / 64.0) * (10.0 * (1e-15 + power).log10() - 6.0)).clamp(-1.0, 1.0)
}

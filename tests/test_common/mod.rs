//! Shared test infrastructure: deterministic noise and synthetic speech-like
//! signals cut into encoder frames.

#![allow(dead_code)]

use lpcnet_features::FRAME_SIZE;

// ---------------------------------------------------------------------------
// Deterministic RNG (Marsaglia MWC)
// ---------------------------------------------------------------------------

/// Multiply-with-carry generator; identical sequences on every platform.
pub struct TestRng {
    rz: u32,
    rw: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self {
            rz: seed,
            rw: seed ^ 0x5bd1_e995,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.rz = 36969u32
            .wrapping_mul(self.rz & 65535)
            .wrapping_add(self.rz >> 16);
        self.rw = 18000u32
            .wrapping_mul(self.rw & 65535)
            .wrapping_add(self.rw >> 16);
        (self.rz << 16).wrapping_add(self.rw)
    }

    /// Uniform sample in [-1, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() as i32 >> 8) as f32 / (1 << 23) as f32
    }
}

// ---------------------------------------------------------------------------
// Signal generators
// ---------------------------------------------------------------------------

/// White noise on the 16-bit scale.
pub fn noise(frames: usize, amplitude: f32, seed: u32) -> Vec<i16> {
    let mut rng = TestRng::new(seed);
    (0..frames * FRAME_SIZE)
        .map(|_| (rng.next_f32() * amplitude) as i16)
        .collect()
}

/// Pure sinusoid with a period of `period` samples.
pub fn sinusoid(frames: usize, period: f32, amplitude: f32) -> Vec<i16> {
    (0..frames * FRAME_SIZE)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * n as f64 / period as f64;
            (amplitude as f64 * phase.sin()).round() as i16
        })
        .collect()
}

/// Iterate over consecutive encoder frames of a signal.
pub fn frames(signal: &[i16]) -> impl Iterator<Item = &[i16]> {
    signal.chunks_exact(FRAME_SIZE)
}

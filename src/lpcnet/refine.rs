//! Cleanup of the half-frame correlation curves before tracking.
//!
//! Curves are indexed by `PITCH_MAX_PERIOD - lag`, so index 0 is the
//! longest period and higher indices are shorter periods.

use super::{PITCH_MAX_PERIOD, PITCH_MIN_PERIOD};

/// Interpolation kernel for a 3x lag upsampling, centre tap at index 3.
static INTERP_KERNEL: [f32; 7] = [
    0.026184, -0.098339, 0.369938, 0.837891, -0.184969, 0.070242, -0.020947,
];

const OCTAVE_MARGIN: f32 = 1.1;
const OCTAVE_ATTENUATION: f32 = 0.8;

/// Replace each interior lag by the largest of itself and its two
/// fractional neighbours.
///
/// The first and last four lags are left as they are. Every interpolated
/// value is computed from the unmodified curve.
pub fn interpolate_peaks(xc: &mut [f32; PITCH_MAX_PERIOD]) {
    let mut interpolated = [0.0f32; PITCH_MAX_PERIOD];
    for i in 4..PITCH_MAX_PERIOD - 4 {
        let mut val1 = 0.0f32;
        let mut val2 = 0.0f32;
        for (j, &k) in INTERP_KERNEL.iter().enumerate() {
            val1 += xc[i - 3 + j] * k;
            val2 += xc[i + 3 - j] * k;
        }
        interpolated[i] = xc[i].max(val1.max(val2));
    }
    xc[4..PITCH_MAX_PERIOD - 4].copy_from_slice(&interpolated[4..PITCH_MAX_PERIOD - 4]);
}

/// Attenuate long lags whose half lag correlates about as well.
///
/// A lag `L` keeps its value only if it beats 1.1x the best of the lags
/// around `L / 2`; otherwise it is scaled by 0.8.
pub fn suppress_octave_errors(xc: &mut [f32; PITCH_MAX_PERIOD]) {
    for i in 0..PITCH_MAX_PERIOD - 2 * PITCH_MIN_PERIOD {
        let half = xc[(PITCH_MAX_PERIOD + i) / 2]
            .max(xc[(PITCH_MAX_PERIOD + i + 2) / 2])
            .max(xc[(PITCH_MAX_PERIOD + i - 1) / 2]);
        if xc[i] < OCTAVE_MARGIN * half {
            xc[i] *= OCTAVE_ATTENUATION;
        }
    }
}

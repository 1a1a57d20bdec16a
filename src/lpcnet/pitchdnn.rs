//! Pitch oracle interface.
//!
//! The encoder hands every frame's instantaneous-frequency features and
//! full-frame correlation curve to a [`PitchEstimator`] and stores whatever
//! it returns as the pitch feature. A trained network plugs in here; the
//! default [`XcorrPeakEstimator`] picks a lag straight from the curve.

use super::{NB_XCORR_FEATURES, PITCH_IF_FEATURES, PITCH_MAX_PERIOD};

/// Only local maxima within this fraction of the curve's peak are considered.
const PEAK_FRACTION: f32 = 0.85;

/// Source of the per-frame pitch feature.
pub trait PitchEstimator {
    /// Forget any state carried between frames.
    fn reset(&mut self) {}

    /// Pitch feature for one frame.
    ///
    /// `xcorr_features[i]` is the normalized correlation at lag
    /// `PITCH_MAX_PERIOD - i`.
    fn estimate(
        &mut self,
        if_features: &[f32; PITCH_IF_FEATURES],
        xcorr_features: &[f32; NB_XCORR_FEATURES],
    ) -> f32;
}

impl<E: PitchEstimator + ?Sized> PitchEstimator for Box<E> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn estimate(
        &mut self,
        if_features: &[f32; PITCH_IF_FEATURES],
        xcorr_features: &[f32; NB_XCORR_FEATURES],
    ) -> f32 {
        (**self).estimate(if_features, xcorr_features)
    }
}

/// Pitch feature for a period in samples: `log2(256 / period) - 1.5`.
pub fn period_to_feature(period: f32) -> f32 {
    (PITCH_MAX_PERIOD as f32 / period).log2() - 1.5
}

/// Inverse of [`period_to_feature`].
pub fn feature_to_period(feature: f32) -> f32 {
    PITCH_MAX_PERIOD as f32 / (feature + 1.5).exp2()
}

/// Stateless oracle that reads the period off the correlation curve.
///
/// Takes the shortest lag that is a local maximum within 85% of the
/// global peak, which keeps it off multiples of the true period.
#[derive(Clone, Copy, Debug, Default)]
pub struct XcorrPeakEstimator;

impl PitchEstimator for XcorrPeakEstimator {
    fn estimate(
        &mut self,
        _if_features: &[f32; PITCH_IF_FEATURES],
        xcorr_features: &[f32; NB_XCORR_FEATURES],
    ) -> f32 {
        let index = shortest_strong_peak(xcorr_features);
        period_to_feature((PITCH_MAX_PERIOD - index) as f32)
    }
}

fn shortest_strong_peak(xc: &[f32; NB_XCORR_FEATURES]) -> usize {
    let (peak_index, peak) = xc
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    if peak <= 0.0 {
        return peak_index;
    }
    let threshold = PEAK_FRACTION * peak;
    // the ends of the curve count as maxima against their one neighbour
    let at = |i: usize| xc.get(i).copied().unwrap_or(f32::NEG_INFINITY);
    (0..NB_XCORR_FEATURES)
        .rev()
        .find(|&i| {
            let left = i.checked_sub(1).map_or(f32::NEG_INFINITY, at);
            xc[i] >= threshold && xc[i] >= left && xc[i] >= at(i + 1)
        })
        .unwrap_or(peak_index)
}

//! Dynamic-programming pitch tracker.
//!
//! Every half frame adds one step to a path over the `NB_XCORR_FEATURES`
//! candidate lags. A lag's score is the best predecessor score, less a
//! quadratic penalty for moving, plus the weighted correlation at that lag.
//! Predecessors within four lags are considered; anything further away
//! is reachable only as a jump from the previous best lag at a fixed cost.

use super::{NB_XCORR_FEATURES, PITCH_MAX_PERIOD};

/// Lags scanned on either side of a candidate for a predecessor.
const SEARCH_RADIUS: usize = 4;
/// Penalty per squared lag step between consecutive half frames.
const TRANSITION_PENALTY: f32 = 0.02;
/// Cost of jumping anywhere from the previous best lag.
const JUMP_PENALTY: f32 = 6.0;

/// Shortest and longest value of `lag[0] + lag[1]` used for the lag feature.
const LAG_SUM_MIN: usize = 66;
const LAG_SUM_MAX: usize = 510;

/// Outcome of tracking one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchTrack {
    /// Backtracked lag of each half frame, in samples.
    pub lags: [usize; 2],
    /// Weighted mean correlation along the backtracked path.
    pub path_correlation: f32,
}

impl PitchTrack {
    /// Mean period of the two half frames, in samples.
    pub fn period(&self) -> usize {
        (self.lags[0] + self.lags[1]) / 2
    }

    /// Lag-derived pitch on the model's feature scale.
    pub fn lag_feature(&self) -> f32 {
        let sum = (self.lags[0] + self.lags[1]).clamp(LAG_SUM_MIN, LAG_SUM_MAX);
        0.01 * (sum as f32 - 200.0)
    }
}

/// Turn the two half-frame energies into weights that sum to 2.
///
/// Silence gets equal weights.
pub fn normalize_frame_weights(energy: [f32; 2]) -> [f32; 2] {
    let total = energy[0] + energy[1];
    if total <= 0.0 {
        return [1.0, 1.0];
    }
    let scale = 2.0 / (1e-15 + total);
    [energy[0] * scale, energy[1] * scale]
}

/// Path scores and the best lag so far, carried across frames.
#[derive(Clone, Debug)]
pub struct PitchPathTracker {
    scores: [[f32; NB_XCORR_FEATURES]; 2],
    latest: usize,
    best_path_score: f32,
    best_lag_index: usize,
}

impl Default for PitchPathTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchPathTracker {
    pub fn new() -> Self {
        PitchPathTracker {
            scores: [[0.0; NB_XCORR_FEATURES]; 2],
            latest: 0,
            best_path_score: 0.0,
            best_lag_index: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Scores after the last step, renormalized so the best is 0.
    pub fn scores(&self) -> &[f32; NB_XCORR_FEATURES] {
        &self.scores[self.latest]
    }

    /// Best score of the last step before renormalization.
    pub fn best_path_score(&self) -> f32 {
        self.best_path_score
    }

    /// Curve index of the best lag after the last step.
    pub fn best_lag_index(&self) -> usize {
        self.best_lag_index
    }

    /// Advance the path by one half frame.
    ///
    /// `xc` is the refined correlation curve (only its first
    /// `NB_XCORR_FEATURES` entries are used) and `backptr` receives the
    /// predecessor chosen for every lag.
    pub fn step(&mut self, xc: &[f32], weight: f32, backptr: &mut [usize; NB_XCORR_FEATURES]) {
        let jump_score = self.best_path_score - JUMP_PENALTY;
        let jump_from = self.best_lag_index;
        let [a, b] = &mut self.scores;
        let (prev, cur) = if self.latest == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        };

        let mut max_path = f32::NEG_INFINITY;
        let mut best_i = 0;
        for i in 0..NB_XCORR_FEATURES {
            let mut max_prev = jump_score;
            backptr[i] = jump_from;
            let lo = i.saturating_sub(SEARCH_RADIUS);
            let hi = (i + SEARCH_RADIUS).min(NB_XCORR_FEATURES - 1);
            for (j, &p) in prev.iter().enumerate().take(hi + 1).skip(lo) {
                let d = i.abs_diff(j) as f32;
                let candidate = p - TRANSITION_PENALTY * d * d;
                if candidate > max_prev {
                    max_prev = candidate;
                    backptr[i] = j;
                }
            }
            cur[i] = max_prev + weight * xc[i];
            if cur[i] > max_path {
                max_path = cur[i];
                best_i = i;
            }
        }
        for v in cur.iter_mut() {
            *v -= max_path;
        }

        self.latest ^= 1;
        self.best_path_score = max_path;
        self.best_lag_index = best_i;
    }

    /// Run both half frames of one frame and backtrack through them.
    pub fn track_frame(
        &mut self,
        xc: &[[f32; PITCH_MAX_PERIOD]; 2],
        weights: &[f32; 2],
    ) -> PitchTrack {
        let mut backptr = [[0usize; NB_XCORR_FEATURES]; 2];
        for (sub, bp) in backptr.iter_mut().enumerate() {
            self.step(&xc[sub], weights[sub], bp);
        }

        let mut best_i = self.best_lag_index;
        let mut lags = [0usize; 2];
        let mut corr = 0.0f32;
        for sub in (0..2).rev() {
            lags[sub] = PITCH_MAX_PERIOD - best_i;
            corr += weights[sub] * xc[sub][best_i];
            best_i = backptr[sub][best_i];
        }
        PitchTrack {
            lags,
            path_correlation: corr / 2.0,
        }
    }
}

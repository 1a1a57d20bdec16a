//! Per-stream encoder context and the frame pipeline.

use std::io::Write;

use log::{debug, trace};

use super::analysis::SpectralAnalyzer;
use super::excitation::ExcitationGenerator;
use super::pitch_path::{normalize_frame_weights, PitchPathTracker, PitchTrack};
use super::pitchdnn::{PitchEstimator, XcorrPeakEstimator};
use super::refine::{interpolate_peaks, suppress_octave_errors};
use super::sink::FeatureWriter;
use super::{
    FRAME_SIZE, LPC_FEATURES, LPC_ORDER, NB_TOTAL_FEATURES, NB_XCORR_FEATURES,
    PITCH_FEATURE, PITCH_IF_FEATURES, PITCH_MAX_PERIOD, PREEMPHASIS, TRAINING_OFFSET,
    VOICING_FEATURE,
};
use crate::dsp::filters::{lin2ulaw, preemphasis};
use crate::dsp::xcorr::normalized_xcorr;
use crate::error::{Error, Result};

/// Map a normalized correlation onto [0, 1] with a scaled softplus.
pub fn voicing_confidence(corr: f32) -> f32 {
    (1.0 + (5.0 * corr).exp()).ln() / (1.0 + 5.0f32.exp()).ln()
}

/// LPCNet encoder state for feature extraction.
///
/// One context per audio stream; frames must be fed in order. The pitch
/// oracle is a type parameter so a trained network can replace the default
/// correlation-peak picker without boxing.
///
/// The two pipeline halves are internal; a frame only advances through one
/// of the `compute_single_frame_features*` entry points:
///
/// ```compile_fail
/// let mut enc = lpcnet_features::LPCNetEncState::new();
/// enc.process_single_frame();
/// ```
#[derive(Clone, Debug)]
pub struct LPCNetEncState<E: PitchEstimator = XcorrPeakEstimator> {
    pitch_estimator: E,
    analyzer: SpectralAnalyzer,
    excitation: ExcitationGenerator,
    tracker: PitchPathTracker,
    mem_preemph: f32,
    exc_mem: u8,
    if_features: [f32; PITCH_IF_FEATURES],
    xcorr_features: [f32; NB_XCORR_FEATURES],
    dnn_pitch: f32,
    xc: [[f32; PITCH_MAX_PERIOD]; 2],
    frame_weight: [f32; 2],
    lpc: [f32; LPC_ORDER],
    features: [f32; NB_TOTAL_FEATURES],
    track: PitchTrack,
    frames: u64,
}

impl Default for LPCNetEncState {
    fn default() -> Self {
        Self::new()
    }
}

impl LPCNetEncState {
    pub fn new() -> Self {
        Self::with_estimator(XcorrPeakEstimator)
    }
}

impl<E: PitchEstimator> LPCNetEncState<E> {
    pub fn with_estimator(pitch_estimator: E) -> Self {
        let mut st = LPCNetEncState {
            pitch_estimator,
            analyzer: SpectralAnalyzer::new(),
            excitation: ExcitationGenerator::default(),
            tracker: PitchPathTracker::new(),
            mem_preemph: 0.0,
            exc_mem: 0,
            if_features: [0.0; PITCH_IF_FEATURES],
            xcorr_features: [0.0; NB_XCORR_FEATURES],
            dnn_pitch: 0.0,
            xc: [[0.0; PITCH_MAX_PERIOD]; 2],
            frame_weight: [0.0; 2],
            lpc: [0.0; LPC_ORDER],
            features: [0.0; NB_TOTAL_FEATURES],
            track: PitchTrack::default(),
            frames: 0,
        };
        st.init();
        st
    }

    /// Return to the freshly constructed state.
    ///
    /// Every filter memory, history buffer and path score is cleared and the
    /// pitch oracle is reset. Afterwards the context produces exactly what a
    /// new one would for the same input.
    pub fn init(&mut self) {
        self.analyzer.reset();
        self.excitation.reset();
        self.tracker.reset();
        self.pitch_estimator.reset();
        self.mem_preemph = 0.0;
        self.exc_mem = lin2ulaw(0.0);
        self.if_features.fill(0.0);
        self.xcorr_features.fill(0.0);
        self.dnn_pitch = 0.0;
        for xc in self.xc.iter_mut() {
            xc.fill(0.0);
        }
        self.frame_weight = [0.0; 2];
        self.lpc.fill(0.0);
        self.features.fill(0.0);
        self.track = PitchTrack::default();
        self.frames = 0;
        debug!("lpcnet encoder initialized");
    }

    /// Features of one frame of 16-bit PCM.
    ///
    /// `pcm` must hold exactly `FRAME_SIZE` samples; otherwise the context
    /// is left untouched and [`Error::FrameLength`] is returned.
    pub fn compute_single_frame_features(
        &mut self,
        pcm: &[i16],
    ) -> Result<[f32; NB_TOTAL_FEATURES]> {
        let mut x = frame_from(pcm, |s| s as f32)?;
        Ok(self.compute_preemphasized(&mut x))
    }

    /// Features of one frame of float PCM on the 16-bit scale.
    pub fn compute_single_frame_features_float(
        &mut self,
        pcm: &[f32],
    ) -> Result<[f32; NB_TOTAL_FEATURES]> {
        let mut x = frame_from(pcm, |s| s)?;
        Ok(self.compute_preemphasized(&mut x))
    }

    /// Compute one frame and append the vector to `sink`.
    pub fn compute_single_frame_features_to<W: Write>(
        &mut self,
        pcm: &[i16],
        sink: &mut FeatureWriter<W>,
    ) -> Result<[f32; NB_TOTAL_FEATURES]> {
        let features = self.compute_single_frame_features(pcm)?;
        sink.write_frame(&features)?;
        Ok(features)
    }

    fn compute_preemphasized(&mut self, x: &mut [f32; FRAME_SIZE]) -> [f32; NB_TOTAL_FEATURES] {
        preemphasis(x, &mut self.mem_preemph, PREEMPHASIS);
        self.compute_frame_features(x);
        self.process_single_frame();
        self.frames += 1;
        trace!(
            "frame {}: lags {:?} corr {:.3} pitch {:.3} voicing {:.3}",
            self.frames,
            self.track.lags,
            self.track.path_correlation,
            self.features[PITCH_FEATURE],
            self.features[VOICING_FEATURE],
        );
        self.features
    }

    /// Analysis of one pre-emphasized frame, up to the refined half-frame
    /// correlation curves.
    pub(crate) fn compute_frame_features(&mut self, input: &[f32; FRAME_SIZE]) {
        // The residual path runs TRAINING_OFFSET samples behind the analysis.
        let mut aligned_in = [0.0f32; FRAME_SIZE];
        aligned_in[..TRAINING_OFFSET].copy_from_slice(self.analyzer.overlap_tail(TRAINING_OFFSET));
        aligned_in[TRAINING_OFFSET..].copy_from_slice(&input[..FRAME_SIZE - TRAINING_OFFSET]);

        let spectrum = self.analyzer.analyze(input);
        self.analyzer
            .instantaneous_frequency(&spectrum.bins, &mut self.if_features);
        self.analyzer
            .cepstrum(&spectrum.band_energy, &mut self.features);
        self.analyzer
            .tables()
            .lpc_from_cepstrum(&mut self.lpc, &self.features);
        self.features[LPC_FEATURES..].copy_from_slice(&self.lpc);

        self.excitation.process(&aligned_in, &self.lpc);
        let exc = self.excitation.excitation().as_slice();

        let mut scratch = [0.0f32; PITCH_MAX_PERIOD];
        normalized_xcorr(
            &exc[PITCH_MAX_PERIOD..],
            exc,
            &mut self.xcorr_features,
            &mut scratch,
            FRAME_SIZE,
        );
        self.dnn_pitch = self
            .pitch_estimator
            .estimate(&self.if_features, &self.xcorr_features);

        const HALF: usize = FRAME_SIZE / 2;
        for (sub, xc) in self.xc.iter_mut().enumerate() {
            let off = sub * HALF;
            self.frame_weight[sub] = normalized_xcorr(
                &exc[PITCH_MAX_PERIOD + off..],
                &exc[off..],
                xc,
                &mut scratch,
                HALF,
            );
            interpolate_peaks(xc);
        }
    }

    /// Track the pitch path through the current frame and fill in the
    /// pitch and voicing features.
    pub(crate) fn process_single_frame(&mut self) {
        self.frame_weight = normalize_frame_weights(self.frame_weight);
        for xc in self.xc.iter_mut() {
            suppress_octave_errors(xc);
        }
        self.track = self.tracker.track_frame(&self.xc, &self.frame_weight);

        let corr = self.excitation.frame_correlation(self.track.period());
        self.features[PITCH_FEATURE] = self.dnn_pitch;
        self.features[VOICING_FEATURE] = voicing_confidence(corr) - 0.5;
    }

    /// Feature vector of the last frame.
    pub fn features(&self) -> &[f32; NB_TOTAL_FEATURES] {
        &self.features
    }

    pub fn lpc(&self) -> &[f32; LPC_ORDER] {
        &self.lpc
    }

    pub fn if_features(&self) -> &[f32; PITCH_IF_FEATURES] {
        &self.if_features
    }

    pub fn xcorr_features(&self) -> &[f32; NB_XCORR_FEATURES] {
        &self.xcorr_features
    }

    /// Pitch feature returned by the oracle for the last frame.
    pub fn dnn_pitch(&self) -> f32 {
        self.dnn_pitch
    }

    /// Half-frame weights used by the last tracking step; they sum to 2.
    pub fn frame_weights(&self) -> [f32; 2] {
        self.frame_weight
    }

    /// Backtracked lags and path correlation of the last frame.
    pub fn pitch_track(&self) -> PitchTrack {
        self.track
    }

    pub fn tracker(&self) -> &PitchPathTracker {
        &self.tracker
    }

    /// u-law excitation seed for a synthesis stage downstream.
    pub fn exc_mem(&self) -> u8 {
        self.exc_mem
    }

    pub fn pitch_estimator(&self) -> &E {
        &self.pitch_estimator
    }

    pub fn pitch_estimator_mut(&mut self) -> &mut E {
        &mut self.pitch_estimator
    }

    /// Frames processed since the last [`init`](Self::init).
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

fn frame_from<T: Copy>(pcm: &[T], convert: impl Fn(T) -> f32) -> Result<[f32; FRAME_SIZE]> {
    if pcm.len() != FRAME_SIZE {
        return Err(Error::FrameLength {
            expected: FRAME_SIZE,
            actual: pcm.len(),
        });
    }
    let mut x = [0.0f32; FRAME_SIZE];
    for (d, &s) in x.iter_mut().zip(pcm) {
        *d = convert(s);
    }
    Ok(x)
}

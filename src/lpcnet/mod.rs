//! LPCNet feature extraction.
//!
//! Each 10 ms frame of 16 kHz audio becomes one [`NB_TOTAL_FEATURES`]-long
//! vector: 18 cepstral coefficients, a pitch estimate, a voicing confidence
//! and 16 LPC coefficients. The work is split the way the data flows:
//!
//! - [`analysis`]: windowed spectrum, band energies, instantaneous-frequency
//!   features and the cepstrum.
//! - [`excitation`]: LPC residual and its low-passed copy, kept in rolling
//!   history buffers for lag lookups.
//! - [`refine`]: octave-error suppression and 3x lag interpolation of the
//!   half-frame correlation curves.
//! - [`pitch_path`]: the dynamic-programming pitch tracker.
//! - [`pitchdnn`]: the pitch oracle interface.
//! - [`enc`]: the per-stream context that ties the pieces together.
//! - [`sink`]: raw little-endian feature files.

pub mod analysis;
pub mod enc;
pub mod excitation;
pub mod freq;
pub mod pitch_path;
pub mod pitchdnn;
pub mod refine;
pub mod sink;

pub use enc::LPCNetEncState;
pub use pitch_path::PitchTrack;
pub use pitchdnn::{PitchEstimator, XcorrPeakEstimator};
pub use sink::{FeatureReader, FeatureWriter};

/// Input sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16000;

/// Samples per 5 ms.
const SAMPLES_PER_5MS: usize = 80;

/// Frame size in samples (10 ms).
pub const FRAME_SIZE: usize = 2 * SAMPLES_PER_5MS;
/// Analysis window overlap with the previous frame.
pub const OVERLAP_SIZE: usize = 2 * SAMPLES_PER_5MS;
/// Analysis window length.
pub const WINDOW_SIZE: usize = FRAME_SIZE + OVERLAP_SIZE;
/// Non-redundant spectral bins of one window.
pub const FREQ_SIZE: usize = WINDOW_SIZE / 2 + 1;

/// Number of perceptual bands (and cepstral coefficients).
pub const NB_BANDS: usize = 18;
/// LPC order.
pub const LPC_ORDER: usize = 16;
/// Pre-emphasis coefficient applied to the input.
pub const PREEMPHASIS: f32 = 0.85;

/// Shortest pitch period considered, in samples.
pub const PITCH_MIN_PERIOD: usize = 32;
/// Longest pitch period considered, in samples.
pub const PITCH_MAX_PERIOD: usize = 256;
/// Correlation lags handed to the pitch oracle and tracked by the DP.
pub const NB_XCORR_FEATURES: usize = PITCH_MAX_PERIOD - PITCH_MIN_PERIOD;

/// Spectral bins used for instantaneous-frequency features.
pub const PITCH_IF_MAX_FREQ: usize = 30;
/// Instantaneous-frequency feature count.
pub const PITCH_IF_FEATURES: usize = 3 * PITCH_IF_MAX_FREQ - 2;

/// Delay applied to the residual path so it lines up with the analysis
/// window the LPC was derived from.
pub const TRAINING_OFFSET: usize = SAMPLES_PER_5MS;

/// Cepstrum, pitch and voicing.
pub const NB_FEATURES: usize = NB_BANDS + 2;
/// Everything emitted per frame, LPC included.
pub const NB_TOTAL_FEATURES: usize = NB_FEATURES + LPC_ORDER;

/// Index of the pitch feature.
pub const PITCH_FEATURE: usize = NB_BANDS;
/// Index of the voicing-confidence feature.
pub const VOICING_FEATURE: usize = NB_BANDS + 1;
/// Index of the first LPC coefficient.
pub const LPC_FEATURES: usize = NB_FEATURES;

const _: () = assert!(OVERLAP_SIZE <= FRAME_SIZE);
const _: () = assert!(TRAINING_OFFSET <= OVERLAP_SIZE);

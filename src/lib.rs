//! Streaming LPCNet feature extraction for 16 kHz speech.
//!
//! Feed 10 ms frames (160 samples) to an [`LPCNetEncState`] and get back one
//! 36-value vector per frame: an 18-band cepstrum, a pitch feature, a
//! voicing confidence and 16 LPC coefficients. Pitch is tracked across
//! frames with a dynamic-programming search over normalized correlation
//! curves of the LPC residual; the pitch feature itself comes from a
//! pluggable [`PitchEstimator`].
//!
//! ```no_run
//! use lpcnet_features::{FeatureWriter, LPCNetEncState, FRAME_SIZE};
//!
//! # fn main() -> lpcnet_features::Result<()> {
//! let mut enc = LPCNetEncState::new();
//! let mut sink = FeatureWriter::new(std::io::sink());
//! let pcm = [0i16; FRAME_SIZE];
//! let features = enc.compute_single_frame_features_to(&pcm, &mut sink)?;
//! assert_eq!(features.len(), lpcnet_features::NB_TOTAL_FEATURES);
//! # Ok(())
//! # }
//! ```

mod dsp;
mod error;
pub mod lpcnet;

pub use error::{Error, Result};
pub use lpcnet::{
    FeatureReader, FeatureWriter, LPCNetEncState, PitchEstimator, PitchTrack, XcorrPeakEstimator,
    FRAME_SIZE, LPC_ORDER, NB_BANDS, NB_FEATURES, NB_TOTAL_FEATURES, SAMPLE_RATE,
};

// =====
// Internal re-exports for tests and benchmarks
// =====
// The DSP primitives stay private to the crate; these re-exports make them
// reachable from tests/ and benches/ without committing to them as API.
#[doc(hidden)]
pub mod internals {
    // -- FFT --
    pub use crate::dsp::kiss_fft::KissFft;

    // -- correlation --
    pub use crate::dsp::xcorr::{inner_prod, normalized_xcorr, pitch_xcorr, xcorr_kernel};

    // -- filters --
    pub use crate::dsp::filters::{biquad, lin2ulaw, preemphasis};
}

//! Numeric building blocks shared by the feature extractor.
//!
//! Nothing in here keeps per-stream state of its own; filters take their
//! memory by reference so the owning context decides its lifetime.

pub mod filters;
pub mod kiss_fft;
pub mod xcorr;

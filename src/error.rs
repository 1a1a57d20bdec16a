//! Error types for feature extraction.

use thiserror::Error;

/// Errors reported by the feature extractor.
///
/// The numeric pipeline itself cannot fail; errors only come from the
/// boundary: a frame of the wrong length, or a feature sink that refuses
/// a write.
#[derive(Debug, Error)]
pub enum Error {
    /// The PCM slice passed to a frame call did not hold exactly one frame.
    #[error("frame must hold {expected} samples, got {actual}")]
    FrameLength { expected: usize, actual: usize },
    /// Reading or writing a feature file failed.
    #[error("feature sink I/O failed")]
    Sink(#[from] std::io::Error),
}

/// A specialized [`Result`](std::result::Result) type for feature extraction.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_length_message_names_both_sizes() {
        let err = Error::FrameLength {
            expected: 160,
            actual: 12,
        };
        assert_eq!(err.to_string(), "frame must hold 160 samples, got 12");
    }

    #[test]
    fn io_errors_convert_into_sink() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Sink(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}

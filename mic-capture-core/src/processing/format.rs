//! Container/codec format negotiation.
//!
//! The backend's speech-to-text endpoint prefers Opus-in-WebM; the priority
//! list walks from there down to uncompressed WAV. If the encoder supports
//! none of the listed formats, negotiation yields `None` and the encoder is
//! created with its own default format.

use crate::traits::encoder::EncoderFactory;

/// Formats probed against the encoder, in preference order.
pub const FORMAT_PRIORITY: [&str; 5] = [
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/mp4",
    "audio/ogg;codecs=opus",
    "audio/wav",
];

/// Content type assumed when the encoder does not report one.
pub const DEFAULT_CONTENT_TYPE: &str = "audio/webm";

/// Pick the first supported format from `FORMAT_PRIORITY`, or `None` to let
/// the encoder use its default.
pub fn negotiate_format(factory: &dyn EncoderFactory) -> Option<&'static str> {
    FORMAT_PRIORITY
        .iter()
        .copied()
        .find(|mime| factory.is_format_supported(mime))
}

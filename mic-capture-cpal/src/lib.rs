//! # mic-capture-cpal
//!
//! Native backend for `mic-capture-core` built on cpal (device input) and
//! hound (WAV encoding).
//!
//! Provides:
//! - `CpalStreamProvider` / `CpalAudioStream` — default input device capture
//!   on a dedicated audio thread, mono f32 fan-out to attached sinks
//! - `WavEncoderFactory` / `WavEncoder` — `audio/wav` encoding via hound
//! - `TapAnalyserFactory` / `TapAnalyser` — time-domain window for level
//!   metering
//!
//! ## Usage
//! ```ignore
//! let mut recorder = mic_capture_cpal::default_recorder();
//! recorder.start()?;
//! // ...
//! let blob = recorder.stop();
//! ```

pub mod device;
pub mod meter;
pub mod wav_encoder;

pub use device::{CpalAudioStream, CpalStreamProvider};
pub use meter::{TapAnalyser, TapAnalyserFactory};
pub use wav_encoder::{WavEncoder, WavEncoderFactory, WAV_MIME};

use mic_capture_core::Recorder;

/// A recorder wired to the default input device, WAV encoding, and level
/// metering.
pub fn default_recorder() -> Recorder<CpalStreamProvider, WavEncoderFactory> {
    Recorder::new(CpalStreamProvider, WavEncoderFactory)
        .with_analyser_factory(Box::new(TapAnalyserFactory))
}

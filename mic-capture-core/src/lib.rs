//! # mic-capture-core
//!
//! Platform-agnostic microphone recording core.
//!
//! Owns the lifecycle of one recording session at a time: stream
//! acquisition, encoder format negotiation, chunk accumulation, live level
//! metering, and deterministic resource teardown. Platform backends
//! implement the capability traits (`StreamProvider`, `EncoderFactory`,
//! `AnalyserFactory`) and plug into the generic `Recorder`.
//!
//! ## Architecture
//!
//! ```text
//! mic-capture-core (this crate)
//! ├── traits/       ← StreamProvider, EncoderFactory, AnalyserFactory, RecorderDelegate
//! ├── models/       ← CaptureError, RecorderState, RecordingBlob, StreamConstraints
//! ├── processing/   ← level metering math, format negotiation
//! └── session/      ← Recorder (generic orchestrator), stop settlement
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::blob::{BlobMetadata, RecordingBlob};
pub use models::constraints::StreamConstraints;
pub use models::diagnostics::SessionDiagnostics;
pub use models::error::CaptureError;
pub use models::state::RecorderState;
pub use processing::format::{negotiate_format, DEFAULT_CONTENT_TYPE, FORMAT_PRIORITY};
pub use processing::level::{level_from_samples, METER_GAIN, METER_SMOOTHING, METER_WINDOW};
pub use session::recorder::Recorder;
pub use traits::analyser::{Analyser, AnalyserFactory};
pub use traits::delegate::RecorderDelegate;
pub use traits::encoder::{ChunkSink, Encoder, EncoderFactory, StopCallback};
pub use traits::stream::{AudioStream, SampleSink, StreamProvider};

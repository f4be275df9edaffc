use std::sync::Arc;

use crate::models::constraints::StreamConstraints;
use crate::models::error::CaptureError;

/// Callback invoked with a block of f32 samples in `[-1.0, 1.0]`, mono.
///
/// Fires on the backend's audio thread — keep processing minimal.
pub type SampleSink = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// A live device audio stream.
///
/// Consumers (encoder, analyser) attach via `add_sink`; the stream fans each
/// captured sample block out to every attached sink in attachment order.
pub trait AudioStream: Send + Sync {
    /// Sample rate of the delivered audio in Hz.
    fn sample_rate(&self) -> u32;

    /// Attach a sample consumer. Sinks cannot be detached individually;
    /// they stop receiving data once the stream's tracks are stopped.
    fn add_sink(&self, sink: SampleSink);

    /// Stop all device tracks and release the underlying hardware.
    ///
    /// Idempotent: subsequent calls are no-ops.
    fn stop_tracks(&self);

    /// Whether the stream is still delivering audio.
    fn is_live(&self) -> bool;
}

/// Interface for acquiring a device audio stream.
///
/// Implementations may block while awaiting a permission grant; there is no
/// way to abort an in-flight request.
pub trait StreamProvider: Send + Sync {
    /// Request microphone access with the given constraints.
    ///
    /// Fails with `PermissionDenied` or `DeviceNotAvailable`; on failure no
    /// resources are retained.
    fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Arc<dyn AudioStream>, CaptureError>;
}

use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::traits::stream::AudioStream;

/// Callback invoked whenever the encoder has a finished chunk of encoded
/// audio available. Chunks are delivered in strict capture order.
pub type ChunkSink = Arc<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// Callback invoked exactly once when the encoder has finished (or failed)
/// finalizing. May fire from an arbitrary thread.
pub type StopCallback = Arc<dyn Fn(Result<(), CaptureError>) + Send + Sync + 'static>;

/// An active media encoder attached to one stream.
pub trait Encoder: Send {
    /// Begin encoding, delivering chunks via `on_chunk`.
    fn start(&mut self, on_chunk: ChunkSink) -> Result<(), CaptureError>;

    /// Request finalization.
    ///
    /// Implementations must flush any pending chunks through the chunk sink
    /// before invoking `on_stop`. `on_stop` is registered before any
    /// finalize work begins, so completion cannot race past it.
    fn request_stop(&mut self, on_stop: StopCallback);

    /// The container/codec label the encoder is producing, if it reports one.
    fn mime_type(&self) -> Option<String>;

    /// Whether the encoder is currently capturing.
    fn is_active(&self) -> bool;
}

/// Factory for encoders, parameterized by a negotiated format.
pub trait EncoderFactory: Send + Sync {
    /// Capability probe used during format negotiation.
    fn is_format_supported(&self, mime_type: &str) -> bool;

    /// Create an encoder attached to `stream`.
    ///
    /// `mime_type: None` means "use the encoder's own default format".
    fn create(
        &self,
        stream: Arc<dyn AudioStream>,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn Encoder>, CaptureError>;
}

use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::traits::stream::AudioStream;

/// A time-domain analyser attached to one stream, used for level metering.
pub trait Analyser: Send + Sync {
    /// Copy the most recent time-domain samples (normalized to `[-1.0, 1.0]`)
    /// into `out`, returning the number of samples written (at most
    /// `out.len()`).
    fn read_time_domain(&self, out: &mut [f32]) -> usize;

    /// Disconnect from the stream and release the processing graph.
    ///
    /// Idempotent. After `close`, `read_time_domain` writes nothing.
    fn close(&self);
}

/// Factory for analysers.
///
/// Construction is best-effort: a failure here means the session proceeds
/// without level metering, it is not a session-aborting error.
pub trait AnalyserFactory: Send + Sync {
    fn create(
        &self,
        stream: Arc<dyn AudioStream>,
        window_size: usize,
        smoothing: f32,
    ) -> Result<Arc<dyn Analyser>, CaptureError>;
}

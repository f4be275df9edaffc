use crate::models::blob::RecordingBlob;
use crate::models::error::CaptureError;
use crate::models::state::RecorderState;

/// Event delegate for recorder notifications.
///
/// Methods may be called from the sampler or encoder threads, not the UI
/// thread. Implementations should marshal to the UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the recorder state changes.
    fn on_state_changed(&self, state: RecorderState);

    /// Called once per sampler tick with the current normalized level.
    fn on_level(&self, level: f32);

    /// Called when an error is recorded in the error slot.
    fn on_error(&self, error: &CaptureError);

    /// Called when `stop` produced a finalized blob.
    fn on_blob_ready(&self, blob: &RecordingBlob);
}

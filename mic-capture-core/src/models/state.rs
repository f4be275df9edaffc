/// Recorder session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → recording → stopping → idle
///           ↓ (acquisition failure)           ↑
///           └────────── idle ─────────────────┘
/// ```
///
/// Failures do not get their own state: the recorder returns to `Idle` and
/// the latest failure is carried in the recorder's error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Starting,
    Recording,
    Stopping,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping)
    }
}

/// Per-session counters for debugging capture behavior.
///
/// Reset at the start of every session; read at any time via
/// `Recorder::diagnostics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    /// Number of chunk notifications delivered by the encoder.
    pub chunk_count: u64,
    /// Total encoded bytes accumulated across chunks.
    pub bytes_captured: u64,
    /// Number of level-sampler ticks that ran.
    pub sampler_ticks: u64,
}

//! Level metering math.
//!
//! Converts a window of time-domain samples into a single normalized meter
//! value. Tuned for visual responsiveness, not loudness accuracy — the value
//! drives a UI meter and nothing else.

/// Number of time-domain samples requested per meter tick.
pub const METER_WINDOW: usize = 256;

/// Smoothing constant passed to the analyser factory.
pub const METER_SMOOTHING: f32 = 0.8;

/// Gain applied to the raw RMS before clamping. Boosts typical speech into
/// the visible range of a 0–1 meter.
pub const METER_GAIN: f32 = 1.5;

/// Compute a meter level in `[0.0, 1.0]` from time-domain samples.
///
/// Samples are clamped to `[-1.0, 1.0]`, squared and averaged (RMS about the
/// zero midpoint), then scaled by `METER_GAIN` and clamped to 1.0.
/// An empty window yields 0.0.
pub fn level_from_samples(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples
        .iter()
        .map(|s| {
            let x = s.clamp(-1.0, 1.0);
            x * x
        })
        .sum();
    let rms = (sum_sq / samples.len() as f32).sqrt();
    (rms * METER_GAIN).min(1.0)
}

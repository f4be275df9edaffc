//! Time-domain tap analyser for level metering.
//!
//! Attaches a sample sink to the stream and keeps the most recent
//! fixed-size window, exponentially smoothed against the previous contents
//! so the meter does not flicker on short blocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use mic_capture_core::{Analyser, AnalyserFactory, AudioStream, CaptureError, SampleSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct TapAnalyserFactory;

impl AnalyserFactory for TapAnalyserFactory {
    fn create(
        &self,
        stream: Arc<dyn AudioStream>,
        window_size: usize,
        smoothing: f32,
    ) -> Result<Arc<dyn Analyser>, CaptureError> {
        if window_size == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "window size must be non-zero".into(),
            ));
        }
        let analyser = Arc::new(TapAnalyser {
            window: Mutex::new(vec![0.0; window_size]),
            smoothing: smoothing.clamp(0.0, 1.0),
            open: AtomicBool::new(true),
        });

        let tap_target = Arc::clone(&analyser);
        let tap: SampleSink = Arc::new(move |block: &[f32]| tap_target.ingest(block));
        stream.add_sink(tap);

        Ok(analyser)
    }
}

pub struct TapAnalyser {
    window: Mutex<Vec<f32>>,
    smoothing: f32,
    open: AtomicBool,
}

impl TapAnalyser {
    fn ingest(&self, block: &[f32]) {
        if block.is_empty() || !self.open.load(Ordering::Relaxed) {
            return;
        }
        let mut window = self.window.lock();
        let len = window.len();

        // Keep only the newest `len` samples of the block.
        let tail = if block.len() >= len {
            &block[block.len() - len..]
        } else {
            block
        };

        window.rotate_left(tail.len() % len);
        let base = len - tail.len();
        for (i, &sample) in tail.iter().enumerate() {
            let slot = &mut window[base + i];
            *slot = self.smoothing * *slot + (1.0 - self.smoothing) * sample;
        }
    }
}

impl Analyser for TapAnalyser {
    fn read_time_domain(&self, out: &mut [f32]) -> usize {
        if !self.open.load(Ordering::SeqCst) {
            return 0;
        }
        let window = self.window.lock();
        let n = window.len().min(out.len());
        out[..n].copy_from_slice(&window[..n]);
        n
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoopStream {
        sinks: Mutex<Vec<SampleSink>>,
    }

    impl LoopStream {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sinks: Mutex::new(Vec::new()),
            })
        }

        fn feed(&self, block: &[f32]) {
            for sink in self.sinks.lock().iter() {
                sink(block);
            }
        }
    }

    impl AudioStream for LoopStream {
        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn add_sink(&self, sink: SampleSink) {
            self.sinks.lock().push(sink);
        }

        fn stop_tracks(&self) {}

        fn is_live(&self) -> bool {
            true
        }
    }

    fn analyser_on(stream: &Arc<LoopStream>, smoothing: f32) -> Arc<dyn Analyser> {
        TapAnalyserFactory
            .create(Arc::clone(stream) as Arc<dyn AudioStream>, 8, smoothing)
            .unwrap()
    }

    #[test]
    fn smooths_toward_incoming_signal() {
        let stream = LoopStream::new();
        let analyser = analyser_on(&stream, 0.8);

        stream.feed(&[1.0; 8]);
        let mut out = [0.0f32; 8];
        assert_eq!(analyser.read_time_domain(&mut out), 8);
        // One block from a zero window: 0.8 * 0 + 0.2 * 1.
        for v in out {
            assert!((v - 0.2).abs() < 1e-6);
        }

        // Repeated blocks converge toward the signal.
        for _ in 0..50 {
            stream.feed(&[1.0; 8]);
        }
        analyser.read_time_domain(&mut out);
        for v in out {
            assert!(v > 0.99);
        }
    }

    #[test]
    fn zero_smoothing_tracks_instantly() {
        let stream = LoopStream::new();
        let analyser = analyser_on(&stream, 0.0);

        stream.feed(&[0.5; 8]);
        let mut out = [0.0f32; 8];
        analyser.read_time_domain(&mut out);
        for v in out {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn oversized_block_keeps_newest_samples() {
        let stream = LoopStream::new();
        let analyser = analyser_on(&stream, 0.0);

        // 16 samples into an 8-slot window: only the last 8 survive.
        let block: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
        stream.feed(&block);

        let mut out = [0.0f32; 8];
        analyser.read_time_domain(&mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[7] - 15.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn closed_analyser_reads_nothing_and_ignores_input() {
        let stream = LoopStream::new();
        let analyser = analyser_on(&stream, 0.0);

        stream.feed(&[0.5; 8]);
        analyser.close();
        stream.feed(&[1.0; 8]);

        let mut out = [0.0f32; 8];
        assert_eq!(analyser.read_time_domain(&mut out), 0);
    }

    #[test]
    fn rejects_zero_window() {
        let stream = LoopStream::new();
        let result = TapAnalyserFactory.create(stream as Arc<dyn AudioStream>, 0, 0.8);
        assert!(matches!(
            result.map(|_| ()),
            Err(CaptureError::ConfigurationFailed(_))
        ));
    }
}

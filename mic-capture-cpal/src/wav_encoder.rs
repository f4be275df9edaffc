//! WAV encoder backed by hound.
//!
//! Supports only the `audio/wav` rung of the format priority list. Samples
//! are accumulated during capture and encoded into a single 16-bit PCM WAV
//! chunk when finalization is requested, mirroring an encoder that delivers
//! all of its data at stop time.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use mic_capture_core::{
    AudioStream, CaptureError, ChunkSink, Encoder, EncoderFactory, SampleSink, StopCallback,
};

pub const WAV_MIME: &str = "audio/wav";

/// Creates [`WavEncoder`]s; rejects any format other than `audio/wav`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoderFactory;

impl EncoderFactory for WavEncoderFactory {
    fn is_format_supported(&self, mime_type: &str) -> bool {
        mime_type == WAV_MIME
    }

    fn create(
        &self,
        stream: Arc<dyn AudioStream>,
        mime_type: Option<&str>,
    ) -> Result<Box<dyn Encoder>, CaptureError> {
        if let Some(requested) = mime_type {
            if requested != WAV_MIME {
                return Err(CaptureError::ConfigurationFailed(format!(
                    "unsupported format: {requested}"
                )));
            }
        }
        Ok(Box::new(WavEncoder {
            stream,
            samples: Arc::new(Mutex::new(Vec::new())),
            capturing: Arc::new(AtomicBool::new(false)),
            sink: None,
        }))
    }
}

pub struct WavEncoder {
    stream: Arc<dyn AudioStream>,
    samples: Arc<Mutex<Vec<f32>>>,
    capturing: Arc<AtomicBool>,
    sink: Option<ChunkSink>,
}

impl Encoder for WavEncoder {
    fn start(&mut self, on_chunk: ChunkSink) -> Result<(), CaptureError> {
        self.sink = Some(on_chunk);
        self.capturing.store(true, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let capturing = Arc::clone(&self.capturing);
        let tap: SampleSink = Arc::new(move |block: &[f32]| {
            if !capturing.load(Ordering::Relaxed) {
                return;
            }
            samples.lock().extend_from_slice(block);
        });
        self.stream.add_sink(tap);
        Ok(())
    }

    fn request_stop(&mut self, on_stop: StopCallback) {
        self.capturing.store(false, Ordering::SeqCst);

        let samples = std::mem::take(&mut *self.samples.lock());
        if samples.is_empty() {
            // Nothing captured; the session layer reports the empty result.
            on_stop(Ok(()));
            return;
        }

        match encode_wav(&samples, self.stream.sample_rate()) {
            Ok(bytes) => {
                if let Some(sink) = &self.sink {
                    sink(bytes);
                }
                on_stop(Ok(()));
            }
            Err(e) => on_stop(Err(CaptureError::EncodingFailed(e))),
        }
    }

    fn mime_type(&self) -> Option<String> {
        Some(WAV_MIME.to_string())
    }

    fn is_active(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }
}

/// Encode mono f32 samples as 16-bit PCM WAV.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| e.to_string())?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(|e| e.to_string())?;
    }
    writer.finalize().map_err(|e| e.to_string())?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoopStream {
        sinks: Mutex<Vec<SampleSink>>,
        live: AtomicBool,
    }

    impl LoopStream {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sinks: Mutex::new(Vec::new()),
                live: AtomicBool::new(true),
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
            16_000
        }

        fn add_sink(&self, sink: SampleSink) {
            self.sinks.lock().push(sink);
        }

        fn stop_tracks(&self) {
            self.live.store(false, Ordering::SeqCst);
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
    }

    fn collecting_sink() -> (ChunkSink, Arc<Mutex<Vec<Vec<u8>>>>) {
        let chunks: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_chunks = Arc::clone(&chunks);
        let sink: ChunkSink = Arc::new(move |chunk| sink_chunks.lock().push(chunk));
        (sink, chunks)
    }

    fn completion() -> (StopCallback, Arc<Mutex<Option<Result<(), CaptureError>>>>) {
        let outcome: Arc<Mutex<Option<Result<(), CaptureError>>>> = Arc::new(Mutex::new(None));
        let cb_outcome = Arc::clone(&outcome);
        let cb: StopCallback = Arc::new(move |result| {
            *cb_outcome.lock() = Some(result);
        });
        (cb, outcome)
    }

    #[test]
    fn factory_supports_only_wav() {
        let factory = WavEncoderFactory;
        assert!(factory.is_format_supported("audio/wav"));
        assert!(!factory.is_format_supported("audio/webm;codecs=opus"));
    }

    #[test]
    fn factory_rejects_foreign_format() {
        let factory = WavEncoderFactory;
        let result = factory.create(LoopStream::new(), Some("audio/mp4"));
        assert!(matches!(
            result.map(|_| ()),
            Err(CaptureError::ConfigurationFailed(_))
        ));
    }

    #[test]
    fn encodes_captured_samples_as_wav() {
        let stream = LoopStream::new();
        let factory = WavEncoderFactory;
        let mut encoder = factory
            .create(Arc::clone(&stream) as Arc<dyn AudioStream>, Some(WAV_MIME))
            .unwrap();

        let (sink, chunks) = collecting_sink();
        encoder.start(sink).unwrap();
        assert!(encoder.is_active());

        stream.feed(&[0.5; 160]);
        stream.feed(&[-0.5; 160]);

        let (on_stop, outcome) = completion();
        encoder.request_stop(on_stop);

        assert_eq!(*outcome.lock(), Some(Ok(())));
        assert!(!encoder.is_active());

        let chunks = chunks.lock();
        assert_eq!(chunks.len(), 1);

        let mut reader = hound::WavReader::new(Cursor::new(chunks[0].clone())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded.len(), 320);
        assert_eq!(decoded[0], (0.5 * i16::MAX as f32) as i16);
        assert_eq!(decoded[160], (-0.5 * i16::MAX as f32) as i16);
    }

    #[test]
    fn empty_capture_completes_without_chunk() {
        let stream = LoopStream::new();
        let mut encoder = WavEncoderFactory.create(stream, None).unwrap();

        let (sink, chunks) = collecting_sink();
        encoder.start(sink).unwrap();

        let (on_stop, outcome) = completion();
        encoder.request_stop(on_stop);

        assert_eq!(*outcome.lock(), Some(Ok(())));
        assert!(chunks.lock().is_empty());
    }

    #[test]
    fn samples_after_stop_are_ignored() {
        let stream = LoopStream::new();
        let mut encoder = WavEncoderFactory
            .create(Arc::clone(&stream) as Arc<dyn AudioStream>, None)
            .unwrap();

        let (sink, chunks) = collecting_sink();
        encoder.start(sink).unwrap();
        stream.feed(&[0.1; 32]);

        let (on_stop, _outcome) = completion();
        encoder.request_stop(on_stop);
        let count_after_stop = chunks.lock().len();

        // The tap is still attached but must drop late audio.
        stream.feed(&[0.9; 32]);
        let (on_stop, outcome) = completion();
        encoder.request_stop(on_stop);

        assert_eq!(chunks.lock().len(), count_after_stop);
        assert_eq!(*outcome.lock(), Some(Ok(())));
    }
}

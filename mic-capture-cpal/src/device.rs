//! Default-input-device stream provider on top of cpal.
//!
//! cpal streams are not `Send`, so each acquired stream is owned by a
//! dedicated audio thread: the thread builds the device stream, reports
//! readiness back to the caller, fans captured samples out to attached
//! sinks, and drops the stream once the tracks are stopped.
//!
//! The echo-cancellation / noise-suppression / auto-gain constraints have no
//! cpal equivalent; whatever processing the OS input stack applies is what
//! the stream delivers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use parking_lot::Mutex;

use mic_capture_core::{AudioStream, CaptureError, SampleSink, StreamConstraints, StreamProvider};

/// Acquires the host's default input device.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalStreamProvider;

impl StreamProvider for CpalStreamProvider {
    fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Arc<dyn AudioStream>, CaptureError> {
        log::debug!("requesting input stream, constraints handled by OS: {:?}", constraints);

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotAvailable)?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::ConfigurationFailed(format!("input config: {e}")))?;

        let sample_format = supported.sample_format();
        let config = supported.config();
        let sample_rate = config.sample_rate.0;
        let channels = usize::from(config.channels.max(1));

        let live = Arc::new(AtomicBool::new(true));
        let sinks: Arc<Mutex<Vec<SampleSink>>> = Arc::new(Mutex::new(Vec::new()));

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();
        let worker = {
            let live = Arc::clone(&live);
            let sinks = Arc::clone(&sinks);
            thread::Builder::new()
                .name("cpal-input".into())
                .spawn(move || {
                    run_input_stream(device, config, sample_format, channels, sinks, live, ready_tx)
                })
                .map_err(|e| CaptureError::Unknown(format!("audio thread: {e}")))?
        };

        let stream = Arc::new(CpalAudioStream {
            sample_rate,
            live,
            sinks,
            worker: Mutex::new(Some(worker)),
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(stream),
            Ok(Err(err)) => {
                stream.stop_tracks();
                Err(err)
            }
            Err(_) => {
                stream.stop_tracks();
                Err(CaptureError::Unknown("audio thread exited early".into()))
            }
        }
    }
}

/// A live default-device input stream, downmixed to mono f32.
pub struct CpalAudioStream {
    sample_rate: u32,
    live: Arc<AtomicBool>,
    sinks: Arc<Mutex<Vec<SampleSink>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AudioStream for CpalAudioStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn add_sink(&self, sink: SampleSink) {
        self.sinks.lock().push(sink);
    }

    fn stop_tracks(&self) {
        if !self.live.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
        self.sinks.lock().clear();
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for CpalAudioStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

fn run_input_stream(
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: SampleFormat,
    channels: usize,
    sinks: Arc<Mutex<Vec<SampleSink>>>,
    live: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<Result<(), CaptureError>>,
) {
    let err_fn = |err: cpal::StreamError| {
        log::error!("input stream error: {err}");
    };

    let deliver = move |mono: Vec<f32>| {
        for sink in sinks.lock().iter() {
            sink(&mono);
        }
    };
    let deliver = Arc::new(deliver);

    let built = match sample_format {
        SampleFormat::F32 => {
            let deliver = Arc::clone(&deliver);
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    deliver(downmix_to_mono(data, channels));
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let deliver = Arc::clone(&deliver);
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let scaled: Vec<f32> =
                        data.iter().map(|s| f32::from(*s) / i16::MAX as f32).collect();
                    deliver(downmix_to_mono(&scaled, channels));
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let deliver = Arc::clone(&deliver);
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let scaled: Vec<f32> = data
                        .iter()
                        .map(|s| (f32::from(*s) / u16::MAX as f32) * 2.0 - 1.0)
                        .collect();
                    deliver(downmix_to_mono(&scaled, channels));
                },
                err_fn,
                None,
            )
        }
        other => {
            let _ = ready_tx.send(Err(CaptureError::ConfigurationFailed(format!(
                "unsupported sample format: {other:?}"
            ))));
            return;
        }
    };

    let stream = match built {
        Ok(stream) => stream,
        Err(cpal::BuildStreamError::DeviceNotAvailable) => {
            let _ = ready_tx.send(Err(CaptureError::DeviceNotAvailable));
            return;
        }
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::Unknown(format!("build stream: {e}"))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::Unknown(format!("start stream: {e}"))));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while live.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(10));
    }
    // Dropping the stream stops device capture.
    drop(stream);
}

fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frames = samples.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let base = frame * channels;
        let sum: f32 = samples[base..base + channels].iter().sum();
        mono.push(sum / channels as f32);
    }
    mono
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let mono = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&mono, 1), mono.to_vec());
    }

    #[test]
    fn downmix_drops_trailing_partial_frame() {
        let samples = [1.0, 1.0, 1.0];
        assert_eq!(downmix_to_mono(&samples, 2), vec![1.0]);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::blob::RecordingBlob;
use crate::models::constraints::StreamConstraints;
use crate::models::diagnostics::SessionDiagnostics;
use crate::models::error::CaptureError;
use crate::models::state::RecorderState;
use crate::processing::format::{negotiate_format, DEFAULT_CONTENT_TYPE};
use crate::processing::level::{level_from_samples, METER_SMOOTHING, METER_WINDOW};
use crate::session::settle::StopSettlement;
use crate::traits::analyser::{Analyser, AnalyserFactory};
use crate::traits::delegate::RecorderDelegate;
use crate::traits::encoder::{ChunkSink, Encoder, EncoderFactory, StopCallback};
use crate::traits::stream::{AudioStream, StreamProvider};

/// Meter refresh cadence, roughly one display frame.
const LEVEL_TICK: Duration = Duration::from_millis(16);

/// How long `stop` waits for the encoder's finalize completion before giving
/// up and cleaning up anyway.
const DEFAULT_FINALIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable recorder state, shared with the sampler thread and the
/// encoder's chunk sink.
struct Shared {
    state: RecorderState,
    level: f32,
    last_error: Option<CaptureError>,
    diagnostics: SessionDiagnostics,
}

/// Everything owned by one start-to-stop recording lifecycle.
struct ActiveSession {
    stream: Arc<dyn AudioStream>,
    encoder: Box<dyn Encoder>,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    analyser: Option<Arc<dyn Analyser>>,
    sampler_running: Arc<AtomicBool>,
    sampler_handle: Option<thread::JoinHandle<()>>,
    started: Instant,
}

/// Single-session microphone recorder.
///
/// Owns the lifecycle of one recording session at a time: acquires the
/// device stream, negotiates an encoding format, accumulates encoded chunks,
/// meters a live level, and finalizes everything into a [`RecordingBlob`] on
/// stop. Every exit path releases the device stream, the sampler task, and
/// the analysis graph.
///
/// Platform capabilities are injected: the stream provider and encoder
/// factory as generics, the analyser factory (optional, best-effort) as a
/// boxed trait object.
pub struct Recorder<P: StreamProvider, E: EncoderFactory> {
    provider: P,
    encoder_factory: E,
    analyser_factory: Option<Box<dyn AnalyserFactory>>,
    constraints: StreamConstraints,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    finalize_timeout: Duration,
    shared: Arc<Mutex<Shared>>,
    session: Option<ActiveSession>,
}

impl<P: StreamProvider, E: EncoderFactory> Recorder<P, E> {
    pub fn new(provider: P, encoder_factory: E) -> Self {
        Self {
            provider,
            encoder_factory,
            analyser_factory: None,
            constraints: StreamConstraints::default(),
            delegate: None,
            finalize_timeout: DEFAULT_FINALIZE_TIMEOUT,
            shared: Arc::new(Mutex::new(Shared {
                state: RecorderState::Idle,
                level: 0.0,
                last_error: None,
                diagnostics: SessionDiagnostics::default(),
            })),
            session: None,
        }
    }

    /// Enable best-effort level metering.
    pub fn with_analyser_factory(mut self, factory: Box<dyn AnalyserFactory>) -> Self {
        self.analyser_factory = Some(factory);
        self
    }

    pub fn with_constraints(mut self, constraints: StreamConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_finalize_timeout(mut self, timeout: Duration) -> Self {
        self.finalize_timeout = timeout;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecorderState {
        self.shared.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.shared.lock().state.is_recording()
    }

    /// Current normalized meter level in `[0.0, 1.0]`.
    pub fn level(&self) -> f32 {
        self.shared.lock().level
    }

    /// Latest recorded error, if any. Cleared when a new session starts.
    pub fn last_error(&self) -> Option<CaptureError> {
        self.shared.lock().last_error.clone()
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.shared.lock().diagnostics
    }

    /// Begin a recording session.
    ///
    /// Acquires the device stream, attaches the (best-effort) analyser,
    /// negotiates an encoding format against the factory's capability probe,
    /// and starts the encoder. On any acquisition failure the error is
    /// recorded, everything acquired so far is released, and the recorder
    /// returns to idle.
    ///
    /// Calling `start` while a session is active is refused with
    /// [`CaptureError::AlreadyActive`]; the live session is untouched.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            // Abandoning the live session would leak the device stream.
            let err = CaptureError::AlreadyActive;
            self.report_error(err.clone());
            return Err(err);
        }

        {
            let mut shared = self.shared.lock();
            shared.last_error = None;
            shared.diagnostics = SessionDiagnostics::default();
        }
        self.set_state(RecorderState::Starting);

        let stream = match self.provider.request_stream(&self.constraints) {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail_start(err)),
        };

        // Level metering is best-effort: without an analyser the session
        // still records, the meter just stays at zero.
        let analyser = self.analyser_factory.as_ref().and_then(|factory| {
            match factory.create(Arc::clone(&stream), METER_WINDOW, METER_SMOOTHING) {
                Ok(analyser) => Some(analyser),
                Err(err) => {
                    log::warn!("level metering unavailable: {err}");
                    None
                }
            }
        });

        let negotiated = negotiate_format(&self.encoder_factory);
        log::debug!("negotiated encoder format: {:?}", negotiated);

        let mut encoder = match self.encoder_factory.create(Arc::clone(&stream), negotiated) {
            Ok(encoder) => encoder,
            Err(err) => {
                stream.stop_tracks();
                if let Some(analyser) = &analyser {
                    analyser.close();
                }
                return Err(self.fail_start(err));
            }
        };

        let chunks: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink: ChunkSink = {
            let chunks = Arc::clone(&chunks);
            let shared = Arc::clone(&self.shared);
            Arc::new(move |chunk: Vec<u8>| {
                if chunk.is_empty() {
                    return;
                }
                {
                    let mut s = shared.lock();
                    s.diagnostics.chunk_count += 1;
                    s.diagnostics.bytes_captured += chunk.len() as u64;
                }
                chunks.lock().push(chunk);
            })
        };

        if let Err(err) = encoder.start(sink) {
            stream.stop_tracks();
            if let Some(analyser) = &analyser {
                analyser.close();
            }
            return Err(self.fail_start(err));
        }

        let sampler_running = Arc::new(AtomicBool::new(false));
        let sampler_handle = analyser.as_ref().map(|analyser| {
            sampler_running.store(true, Ordering::SeqCst);
            spawn_level_sampler(
                Arc::clone(analyser),
                Arc::clone(&self.shared),
                self.delegate.clone(),
                Arc::clone(&sampler_running),
            )
        });

        self.session = Some(ActiveSession {
            stream,
            encoder,
            chunks,
            analyser,
            sampler_running,
            sampler_handle,
            started: Instant::now(),
        });
        self.set_state(RecorderState::Recording);
        Ok(())
    }

    /// End the current session and return its finalized blob.
    ///
    /// With no active session this is a silent no-op returning `None`.
    /// Otherwise the encoder is asked to finalize, the accumulated chunks are
    /// concatenated in capture order, and — regardless of how finalization
    /// went — the device tracks are stopped, the sampler is cancelled, the
    /// analyser is disconnected, and the recorder returns to idle with the
    /// level reset to zero.
    ///
    /// Returns `None` (with the error slot set) on finalize failure, empty
    /// capture, or finalize timeout.
    pub fn stop(&mut self) -> Option<RecordingBlob> {
        let Some(mut session) = self.session.take() else {
            return None;
        };
        self.set_state(RecorderState::Stopping);

        let outcome = if session.encoder.is_active() {
            let settlement = StopSettlement::new();
            let handle = settlement.handle();
            // Register completion before issuing the stop request so a fast
            // encoder cannot finish before anyone is listening.
            let on_stop: StopCallback = Arc::new(move |result| handle.settle(result));
            session.encoder.request_stop(on_stop);
            settlement.wait(self.finalize_timeout)
        } else {
            // Encoder never became (or is no longer) active: treat as an
            // immediate manual finalize over whatever chunks exist.
            Ok(())
        };

        let blob = match outcome {
            Ok(()) => {
                let chunks = std::mem::take(&mut *session.chunks.lock());
                if chunks.is_empty() {
                    self.report_error(CaptureError::EmptyCapture);
                    None
                } else {
                    let content_type = session
                        .encoder
                        .mime_type()
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                    let total: usize = chunks.iter().map(Vec::len).sum();
                    let mut bytes = Vec::with_capacity(total);
                    for chunk in &chunks {
                        bytes.extend_from_slice(chunk);
                    }
                    let duration = session.started.elapsed().as_secs_f64();
                    Some(RecordingBlob::new(bytes, content_type, duration))
                }
            }
            Err(err) => {
                log::error!("finalize failed: {}", err);
                self.report_error(err);
                None
            }
        };

        self.teardown(&mut session);

        if let (Some(delegate), Some(blob)) = (&self.delegate, &blob) {
            delegate.on_blob_ready(blob);
        }
        blob
    }

    /// Release every session resource. Runs on every stop branch and on drop.
    fn teardown(&self, session: &mut ActiveSession) {
        // Device hardware first.
        session.stream.stop_tracks();

        // Cancel and join the sampler before touching the analyser, so no
        // tick can fire against a disconnected graph.
        session.sampler_running.store(false, Ordering::SeqCst);
        if let Some(handle) = session.sampler_handle.take() {
            let _ = handle.join();
        }
        if let Some(analyser) = session.analyser.take() {
            analyser.close();
        }

        {
            let mut shared = self.shared.lock();
            shared.level = 0.0;
            shared.state = RecorderState::Idle;
        }
        if let Some(delegate) = &self.delegate {
            delegate.on_state_changed(RecorderState::Idle);
        }
    }

    fn fail_start(&self, err: CaptureError) -> CaptureError {
        self.report_error(err.clone());
        self.set_state(RecorderState::Idle);
        err
    }

    fn set_state(&self, state: RecorderState) {
        self.shared.lock().state = state;
        if let Some(delegate) = &self.delegate {
            delegate.on_state_changed(state);
        }
    }

    fn report_error(&self, err: CaptureError) {
        if let Some(delegate) = &self.delegate {
            delegate.on_error(&err);
        }
        self.shared.lock().last_error = Some(err);
    }
}

impl<P: StreamProvider, E: EncoderFactory> Drop for Recorder<P, E> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            log::warn!("recorder dropped mid-session, releasing device resources");
            self.teardown(&mut session);
        }
    }
}

fn spawn_level_sampler(
    analyser: Arc<dyn Analyser>,
    shared: Arc<Mutex<Shared>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("level-sampler".into())
        .spawn(move || {
            let mut window = vec![0.0f32; METER_WINDOW];
            while running.load(Ordering::SeqCst) {
                thread::sleep(LEVEL_TICK);
                // Re-check after the sleep so no tick runs once teardown
                // has begun.
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let n = analyser.read_time_domain(&mut window);
                let level = level_from_samples(&window[..n]);
                {
                    let mut s = shared.lock();
                    s.level = level;
                    s.diagnostics.sampler_ticks += 1;
                }
                if let Some(delegate) = &delegate {
                    delegate.on_level(level);
                }
            }
        })
        .expect("failed to spawn level-sampler thread")
}

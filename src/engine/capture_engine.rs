use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;
use crate::models::geometry::FrameGeometry;
use crate::models::state::EngineState;
use crate::storage::frame_sink::{FrameSink, PathProvider};
use crate::traits::audio_source::AudioSource;
use crate::traits::frame_codec::FrameCodec;

/// Optional per-session output streams, each named lazily by a provider
/// that runs on the worker thread when the first frame needs that sink.
///
/// The decoded stream is derived from the encoded one: frames are only
/// decoded from packets produced for the encoded sink, so supplying
/// `decoded` without `encoded` yields no decoded output.
#[derive(Default)]
pub struct SinkPaths {
    /// Raw PCM exactly as read from the source.
    pub raw: Option<PathProvider>,
    /// Opus packets, concatenated with no length framing.
    pub encoded: Option<PathProvider>,
    /// PCM decoded back from the encoded packets.
    pub decoded: Option<PathProvider>,
}

impl SinkPaths {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Per-session counters, observational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub frames_read: u64,
    pub bytes_delivered: u64,
    pub encode_failures: u64,
    pub decode_failures: u64,
}

struct SinkSet {
    raw: FrameSink,
    encoded: FrameSink,
    decoded: FrameSink,
}

impl SinkSet {
    fn empty() -> Self {
        Self {
            raw: FrameSink::disabled(),
            encoded: FrameSink::disabled(),
            decoded: FrameSink::disabled(),
        }
    }

    fn from_paths(paths: SinkPaths) -> Self {
        let sink = |p: Option<PathProvider>| match p {
            Some(provider) => FrameSink::unopened(provider),
            None => FrameSink::disabled(),
        };
        Self {
            raw: sink(paths.raw),
            encoded: sink(paths.encoded),
            decoded: sink(paths.decoded),
        }
    }

    fn close_all(&mut self) {
        self.raw.close();
        self.encoded.close();
        self.decoded.close();
    }
}

/// Continuous-capture engine: one background worker pulls fixed-size frames
/// from an `AudioSource` and fans them out to the optional sinks and the
/// frame listener.
///
/// Data flow per frame (fixed order; a later stage failing never suppresses
/// an earlier stage's output):
/// ```text
/// [AudioSource::read_into] → trim to bytes read
///     → raw sink
///     → FrameCodec::encode → encoded sink
///         → FrameCodec::decode → decoded sink
///     → listener
/// ```
///
/// Exactly two threads are involved: the controlling thread calling
/// `start`/`stop`/`destroy` and the engine-owned worker. The atomic running
/// flag is the only synchronization between them; `stop` clears it, joins
/// the worker, and only then stops the source and closes sinks.
pub struct CaptureEngine<S: AudioSource + 'static> {
    config: CaptureConfig,
    geometry: FrameGeometry,
    state: EngineState,
    source: Arc<Mutex<S>>,
    codec: Option<Arc<Mutex<Box<dyn FrameCodec>>>>,
    sinks: Arc<Mutex<SinkSet>>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<S: AudioSource + 'static> CaptureEngine<S> {
    /// Validate the configuration, compute frame geometry, and wrap the
    /// already-opened source. No capture starts until `start`.
    ///
    /// `codec` enables the encoded/decoded sinks; a codec built for the same
    /// configuration has already validated the Opus frame size.
    pub fn build(
        source: S,
        config: CaptureConfig,
        codec: Option<Box<dyn FrameCodec>>,
    ) -> Result<Self, CaptureError> {
        let geometry = FrameGeometry::for_config(&config)?;
        log::info!(
            "capture engine built: {:?}Hz {:?} {:?}, buffer {} bytes, {} samples/frame",
            config.sample_rate,
            config.channels,
            config.frame_duration,
            geometry.buffer_size_bytes,
            geometry.samples_per_frame
        );

        Ok(Self {
            config,
            geometry,
            state: EngineState::Stopped,
            source: Arc::new(Mutex::new(source)),
            codec: codec.map(|c| Arc::new(Mutex::new(c))),
            sinks: Arc::new(Mutex::new(SinkSet::empty())),
            diagnostics: Arc::new(Mutex::new(CaptureDiagnostics::default())),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Counters for the current or most recent session.
    pub fn diagnostics(&self) -> CaptureDiagnostics {
        *self.diagnostics.lock()
    }

    /// Start a capture session. No-op when already running.
    ///
    /// The listener runs on the worker thread for every successfully read
    /// frame and should not block excessively. Path providers in `paths` run
    /// lazily, at most once each, also on the worker thread.
    ///
    /// # Panics
    ///
    /// Panics if the engine has been destroyed.
    pub fn start<F>(&mut self, listener: F, paths: SinkPaths) -> Result<(), CaptureError>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        match self.state {
            EngineState::Destroyed => panic!("start called on a destroyed capture engine"),
            EngineState::Running => return Ok(()),
            EngineState::Stopped => {}
        }

        if (paths.encoded.is_some() || paths.decoded.is_some()) && self.codec.is_none() {
            return Err(CaptureError::InvalidConfig(
                "encoded/decoded sinks require a codec".into(),
            ));
        }

        self.source.lock().start_capturing()?;

        *self.sinks.lock() = SinkSet::from_paths(paths);
        *self.diagnostics.lock() = CaptureDiagnostics::default();
        self.running.store(true, Ordering::Release);

        let handle = thread::Builder::new()
            .name("capture-loop".into())
            .spawn(capture_loop(
                Arc::clone(&self.running),
                Arc::clone(&self.source),
                self.codec.as_ref().map(Arc::clone),
                Arc::clone(&self.sinks),
                Arc::clone(&self.diagnostics),
                self.geometry.buffer_size_bytes,
                listener,
            ))
            .expect("failed to spawn capture thread");

        self.worker = Some(handle);
        self.state = EngineState::Running;
        Ok(())
    }

    /// End the current session: signal the worker, wait for it to exit,
    /// then stop the source and close the sinks. No-op when not running.
    ///
    /// The worker exits after its in-flight blocking read returns; there is
    /// no forced interruption. The engine stays reusable.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_running() {
            return Ok(());
        }

        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        let stop_result = self.source.lock().stop_capturing();
        self.sinks.lock().close_all();

        // State transitions even if the source's stop reported an error.
        self.state = EngineState::Stopped;
        stop_result
    }

    /// Stop the session and release the hardware source. Terminal.
    ///
    /// # Panics
    ///
    /// Panics on reentrant destroy; that is a lifecycle bug in the caller.
    pub fn destroy(&mut self) -> Result<(), CaptureError> {
        if self.state.is_destroyed() {
            panic!("destroy called twice on capture engine");
        }

        let stop_result = self.stop();
        let release_result = self.source.lock().release();
        self.state = EngineState::Destroyed;
        stop_result.and(release_result)
    }
}

/// Build the worker closure for one session.
fn capture_loop<S, F>(
    running: Arc<AtomicBool>,
    source: Arc<Mutex<S>>,
    codec: Option<Arc<Mutex<Box<dyn FrameCodec>>>>,
    sinks: Arc<Mutex<SinkSet>>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    buffer_size: usize,
    mut listener: F,
) -> impl FnOnce() + Send + 'static
where
    S: AudioSource + 'static,
    F: FnMut(&[u8]) + Send + 'static,
{
    move || {
        // One reusable buffer for the whole session, touched only here.
        let mut buffer = vec![0u8; buffer_size];

        while running.load(Ordering::Acquire) {
            let read = match source.lock().read_into(&mut buffer) {
                Ok(n) => n,
                Err(e) => {
                    log::error!("audio source read failed, ending capture loop: {e}");
                    break;
                }
            };
            log::trace!("read {read} of {buffer_size} bytes");
            if read == 0 {
                continue;
            }

            // Only the bytes actually read; stale tail bytes from a longer
            // previous read must never reach a sink or the listener.
            let frame = &buffer[..read];

            {
                let mut sinks = sinks.lock();
                sinks.raw.append(frame);

                if sinks.encoded.is_requested() {
                    if let Some(ref codec) = codec {
                        let mut codec = codec.lock();
                        match codec.encode(frame) {
                            Ok(packet) => {
                                sinks.encoded.append(&packet);
                                if sinks.decoded.is_requested() {
                                    match codec.decode(&packet) {
                                        Ok(pcm) => sinks.decoded.append(&pcm),
                                        Err(e) => {
                                            log::warn!("decode failed, skipping frame: {e}");
                                            diagnostics.lock().decode_failures += 1;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                log::warn!("encode failed, skipping frame: {e}");
                                diagnostics.lock().encode_failures += 1;
                            }
                        }
                    }
                }
            }

            {
                let mut d = diagnostics.lock();
                d.frames_read += 1;
                d.bytes_delivered += read as u64;
            }

            listener(frame);
        }
    }
}

//! Frame encoding pipeline — compose a video from a sequence of frames.
//!
//! This module provides [`VideoComposer`], a producer/consumer session that
//! feeds ARGB frames through the pixel converter into a hardware encoder and
//! multiplexes the encoder's output into a container file.
//!
//! The session runs its drain loop on a dedicated thread so the caller's
//! thread is never blocked by codec I/O. Frames are enqueued from any thread
//! via [`enqueue_frame`](VideoComposer::enqueue_frame); the loop pops them in
//! order, converts, submits, and drains encoder output under backpressure.
//! The loop is strictly sequential per frame — out-of-order submission would
//! corrupt encoder timestamps, so no frame-level parallelism is permitted.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepipe::{
//!     CancellationToken, ComposerCallback, Frame, MediaConfig, NoOpProgress,
//!     PipelineError, VideoComposer,
//! };
//! # use framepipe::{CodecProvider, ContainerMuxer};
//! # fn demo(
//! #     provider: &dyn CodecProvider,
//! #     muxer: Box<dyn ContainerMuxer>,
//! #     callback: Arc<dyn ComposerCallback>,
//! # ) -> Result<(), PipelineError> {
//! let mut composer = VideoComposer::configure(
//!     MediaConfig::new().frame_rate(10),
//!     64,
//!     64,
//!     "out.mp4",
//!     provider,
//!     muxer,
//! )?;
//! composer.start(Arc::new(NoOpProgress), CancellationToken::new(), callback);
//!
//! for _ in 0..10 {
//!     composer.enqueue_frame(Frame::solid(64, 64, 0xFFFF0000));
//! }
//! composer.stop();
//! composer.wait();
//! # Ok(())
//! # }
//! ```

use std::{
    collections::VecDeque,
    fs,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{Arc, Condvar, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    codec::{CodecProvider, EncoderDevice, EncoderFormat, OutputEvent},
    config::{ColorLayout, MediaConfig},
    error::PipelineError,
    frame::Frame,
    muxer::{ContainerMuxer, MuxerAdapter},
    progress::{CancellationToken, ProgressSink, ProgressTracker},
    yuv::convert_frame,
};

/// The reference codec rejects a first timestamp of zero; this offset is the
/// minimum it accepts.
const PTS_OFFSET_US: i64 = 132;

/// Poll timeout for codec input/output dequeues. Short so a pending
/// cancellation is observed promptly.
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(10);

/// Upper bound on one wait for the frame queue to refill; the loop re-checks
/// cancellation after every wakeup.
const QUEUE_WAIT: Duration = Duration::from_millis(50);

/// Completion callback for an encode run.
///
/// Exactly one of the two methods is invoked per run, unless the run was
/// aborted or cancelled — a deliberate stop is not surfaced as failure.
pub trait ComposerCallback: Send + Sync {
    /// The container was finalized successfully at `output`.
    fn on_complete(&self, output: &Path);

    /// The run failed; any partial output has been deleted.
    fn on_failed(&self, error: &PipelineError);
}

/// Session lifecycle, guarded by a single lock together with the frame
/// queue. One small state machine instead of ad hoc booleans: a late
/// `enqueue_frame` cannot race a concurrent `abort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Configured, not yet started.
    Idle,
    /// Accepting and draining frames.
    Running,
    /// No more frames will arrive; drain the remainder, then finalize.
    Stopping,
    /// Discard queued frames and delete partial output.
    Aborting,
    /// The drain loop has exited.
    Done,
}

struct Shared {
    queue: VecDeque<Frame>,
    phase: Phase,
}

struct SessionState {
    shared: Mutex<Shared>,
    frames_available: Condvar,
}

/// How a finished drain loop left the output file.
enum LoopExit {
    /// Output finalized, keep it.
    Completed,
    /// Abort or cancellation, delete partial output.
    Discarded,
}

/// A frame encoding session.
///
/// Created with [`configure`](VideoComposer::configure), which selects the
/// codec and resolves the pixel layout before any I/O starts. The session
/// moves through `configure → start → enqueue_frame* → (stop | abort)`.
pub struct VideoComposer {
    state: Arc<SessionState>,
    worker: Option<JoinHandle<()>>,
    // Owned between configure() and start(), then moved into the loop thread.
    device: Option<Box<dyn EncoderDevice>>,
    muxer: Option<MuxerAdapter>,
    config: MediaConfig,
    layout: ColorLayout,
    width: u32,
    height: u32,
    output: PathBuf,
    expected_frames: Option<u64>,
}

impl VideoComposer {
    /// Select the codec, resolve the pixel layout, and bind the output
    /// container location.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidConfig`] if `config.frame_rate` is zero —
    ///   the timestamp formula divides by it.
    /// - [`PipelineError::NoCodecFound`] if no capability advertises
    ///   `config.mime_type`.
    /// - [`PipelineError::UnsupportedLayout`] / [`PipelineError::NoLayoutMatch`]
    ///   if the layout cannot be resolved.
    /// - Any error the device reports while being configured.
    pub fn configure<P: AsRef<Path>>(
        config: MediaConfig,
        width: u32,
        height: u32,
        output: P,
        provider: &dyn CodecProvider,
        muxer: Box<dyn ContainerMuxer>,
    ) -> Result<Self, PipelineError> {
        if config.frame_rate == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "frame_rate must be non-zero".to_string(),
            });
        }

        let mut device =
            provider
                .video_encoder(&config.mime_type)
                .ok_or_else(|| PipelineError::NoCodecFound {
                    mime: config.mime_type.clone(),
                })?;

        let layout = config.resolve_layout(&device.supported_layouts())?;
        let format = EncoderFormat::from_config(&config, width, height, layout);
        device.configure(&format)?;

        log::info!(
            "Encoder configured: {} {width}x{height} @ {} fps, layout {layout:?}",
            config.mime_type,
            config.frame_rate,
        );

        Ok(Self {
            state: Arc::new(SessionState {
                shared: Mutex::new(Shared {
                    queue: VecDeque::new(),
                    phase: Phase::Idle,
                }),
                frames_available: Condvar::new(),
            }),
            worker: None,
            device: Some(device),
            muxer: Some(MuxerAdapter::new(muxer)),
            config,
            layout,
            width,
            height,
            output: output.as_ref().to_path_buf(),
            expected_frames: None,
        })
    }

    /// Hint how many frames will be enqueued, enabling percentage progress.
    pub fn expected_frames(mut self, frames: u64) -> Self {
        self.expected_frames = Some(frames);
        self
    }

    /// Start the drain loop on its dedicated thread.
    ///
    /// Progress is pushed to `sink`; `token` aborts the run when cancelled;
    /// `callback` receives the single completion or failure signal.
    pub fn start(
        &mut self,
        sink: Arc<dyn ProgressSink>,
        token: CancellationToken,
        callback: Arc<dyn ComposerCallback>,
    ) {
        let (Some(device), Some(muxer)) = (self.device.take(), self.muxer.take()) else {
            log::warn!("start() called twice on the same composer; ignoring");
            return;
        };

        {
            let mut shared = self.state.shared.lock().unwrap();
            shared.phase = Phase::Running;
        }

        let worker = LoopWorker {
            device,
            muxer,
            state: Arc::clone(&self.state),
            layout: self.layout,
            width: self.width,
            height: self.height,
            frame_rate: self.config.frame_rate,
            output: self.output.clone(),
            tracker: ProgressTracker::new(sink),
            token,
            callback,
            expected_frames: self.expected_frames,
        };
        self.worker = Some(thread::spawn(move || worker.run()));
    }

    /// Append a frame to the session's queue without blocking.
    ///
    /// Wakes the drain loop if it is waiting for frames. Calls before
    /// [`start`](VideoComposer::start) or after [`stop`](VideoComposer::stop)
    /// / [`abort`](VideoComposer::abort) are logged and dropped, not
    /// surfaced.
    pub fn enqueue_frame(&self, frame: Frame) {
        let mut shared = self.state.shared.lock().unwrap();
        match shared.phase {
            Phase::Running => {
                shared.queue.push_back(frame);
                self.state.frames_available.notify_one();
            }
            phase => {
                log::warn!("Dropping frame enqueued while session is {phase:?}");
            }
        }
    }

    /// Mark that no more frames will arrive.
    ///
    /// Queued frames are not dropped: the loop drains the remainder, then
    /// finalizes the container.
    pub fn stop(&self) {
        let mut shared = self.state.shared.lock().unwrap();
        if shared.phase == Phase::Running {
            shared.phase = Phase::Stopping;
            self.state.frames_available.notify_one();
        }
    }

    /// Mark that no more frames will arrive and discard all queued frames.
    ///
    /// On loop exit the partially written output is deleted.
    pub fn abort(&self) {
        let mut shared = self.state.shared.lock().unwrap();
        if matches!(shared.phase, Phase::Running | Phase::Stopping) {
            shared.phase = Phase::Aborting;
            shared.queue.clear();
            self.state.frames_available.notify_one();
        }
    }

    /// Block until the drain loop has exited.
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for VideoComposer {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

/// Everything the drain loop thread owns for the loop's lifetime.
struct LoopWorker {
    device: Box<dyn EncoderDevice>,
    muxer: MuxerAdapter,
    state: Arc<SessionState>,
    layout: ColorLayout,
    width: u32,
    height: u32,
    frame_rate: u32,
    output: PathBuf,
    tracker: ProgressTracker,
    token: CancellationToken,
    callback: Arc<dyn ComposerCallback>,
    expected_frames: Option<u64>,
}

impl LoopWorker {
    fn run(mut self) {
        // A panicking device must not skip resource release or the
        // completion callback; the panic becomes a failed run.
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.drain_loop()))
            .unwrap_or_else(|_| {
                Err(PipelineError::ComposeError(
                    "encoder drain loop panicked".to_string(),
                ))
            });

        // Resource release happens unconditionally on every exit path.
        self.device.release();
        let muxer_result = self.muxer.release();

        {
            let mut shared = self.state.shared.lock().unwrap();
            shared.phase = Phase::Done;
            shared.queue.clear();
        }

        // A muxer finalization failure only matters if the loop itself
        // completed; a discarded run deletes the file anyway.
        let outcome = match (result, muxer_result) {
            (Ok(LoopExit::Completed), Ok(())) => Ok(LoopExit::Completed),
            (Ok(LoopExit::Completed), Err(error)) => Err(error),
            (Ok(LoopExit::Discarded), _) => Ok(LoopExit::Discarded),
            (Err(error), _) => Err(error),
        };

        match outcome {
            Ok(LoopExit::Completed) => {
                log::info!("Encoding complete: {}", self.output.display());
                self.tracker
                    .emit(100, None, Some(self.output.clone()));
                self.callback.on_complete(&self.output);
            }
            Ok(LoopExit::Discarded) => {
                log::info!("Encoding aborted, deleting {}", self.output.display());
                let _ = fs::remove_file(&self.output);
            }
            Err(error) => {
                log::warn!("Encoding failed: {error}");
                let _ = fs::remove_file(&self.output);
                self.callback.on_failed(&error);
            }
        }
    }

    fn drain_loop(&mut self) -> Result<LoopExit, PipelineError> {
        let mut frame_index: u64 = 0;

        loop {
            if self.token.is_cancelled() {
                return Ok(LoopExit::Discarded);
            }

            let frame = match self.next_frame() {
                QueuePop::Frame(frame) => frame,
                QueuePop::Drained => break,
                QueuePop::Aborted => return Ok(LoopExit::Discarded),
            };

            if frame.width() != self.width || frame.height() != self.height {
                return Err(PipelineError::ComposeError(format!(
                    "frame geometry {}x{} does not match configured {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height,
                )));
            }
            let bytes = convert_frame(&frame, self.layout)?;
            let pts_us = compute_presentation_time(frame_index, self.frame_rate);

            let Some(slot) = self.await_input_slot()? else {
                return Ok(LoopExit::Discarded);
            };
            self.device.submit_input(slot, &bytes, pts_us, false)?;
            log::debug!(
                "Submitted frame {frame_index} ({} bytes, pts {pts_us}µs)",
                bytes.len(),
            );
            frame_index += 1;

            self.drain_output(false)?;
            self.emit_frame_progress(frame_index);
        }

        // Graceful stop: queue drained, push end-of-stream through the
        // encoder and collect the remaining samples.
        let Some(slot) = self.await_input_slot()? else {
            return Ok(LoopExit::Discarded);
        };
        self.device.submit_input(slot, &[], 0, true)?;
        log::debug!("Submitted encoder end-of-stream after {frame_index} frames");

        if self.drain_output(true)? {
            Ok(LoopExit::Completed)
        } else {
            Ok(LoopExit::Discarded)
        }
    }

    /// Pop the next frame, blocking while the queue is momentarily empty but
    /// more frames are still expected.
    fn next_frame(&self) -> QueuePop {
        let mut shared = self.state.shared.lock().unwrap();
        loop {
            match shared.phase {
                Phase::Aborting | Phase::Done => return QueuePop::Aborted,
                _ if self.token.is_cancelled() => return QueuePop::Aborted,
                _ => {}
            }
            if let Some(frame) = shared.queue.pop_front() {
                return QueuePop::Frame(frame);
            }
            if shared.phase == Phase::Stopping {
                return QueuePop::Drained;
            }
            let (guard, _timeout) = self
                .state
                .frames_available
                .wait_timeout(shared, QUEUE_WAIT)
                .unwrap();
            shared = guard;
        }
    }

    /// Poll for a free encoder input slot, observing abort and cancellation
    /// between polls. `None` means the run was aborted while waiting.
    fn await_input_slot(&mut self) -> Result<Option<usize>, PipelineError> {
        loop {
            if self.token.is_cancelled() || self.aborting() {
                return Ok(None);
            }
            if let Some(slot) = self.device.dequeue_input(DEQUEUE_TIMEOUT)? {
                return Ok(Some(slot));
            }
            log::debug!("Encoder input not available, retrying");
        }
    }

    /// Drain encoder output. With `until_eos` the call keeps polling past
    /// `TryAgain` until the end-of-stream sample arrives; otherwise it
    /// returns at the first `TryAgain`. Returns `false` if the run was
    /// aborted while draining.
    fn drain_output(&mut self, until_eos: bool) -> Result<bool, PipelineError> {
        loop {
            if self.token.is_cancelled() || self.aborting() {
                return Ok(false);
            }

            match self.device.dequeue_output(DEQUEUE_TIMEOUT)? {
                OutputEvent::TryAgain => {
                    if !until_eos {
                        return Ok(true);
                    }
                }
                OutputEvent::FormatChanged(descriptor) => {
                    if self.muxer.has_track() {
                        return Err(PipelineError::CodecProtocol(
                            "encoder signalled a second output format change".to_string(),
                        ));
                    }
                    self.muxer.register_track(&descriptor)?;
                }
                OutputEvent::Sample(sample) => {
                    if sample.info.config_only {
                        log::debug!("Skipping codec config sample ({} bytes)", sample.size);
                    } else if sample.size > 0 {
                        let data = self.device.output_bytes(sample.buffer);
                        let range = &data[sample.offset..sample.offset + sample.size];
                        self.muxer.write_sample(range, &sample.info)?;
                    }
                    let end_of_stream = sample.info.end_of_stream;
                    self.device.release_output(sample.buffer)?;
                    if end_of_stream {
                        return Ok(true);
                    }
                }
            }
        }
    }

    fn aborting(&self) -> bool {
        let shared = self.state.shared.lock().unwrap();
        matches!(shared.phase, Phase::Aborting | Phase::Done)
    }

    fn emit_frame_progress(&mut self, processed: u64) {
        let percent = match self.expected_frames {
            // Hold 100 back for the completion event.
            Some(total) if total > 0 => ((processed * 100 / total) as u8).min(99),
            _ => 0,
        };
        self.tracker.emit(percent, None, None);
    }
}

enum QueuePop {
    Frame(Frame),
    Drained,
    Aborted,
}

/// Presentation timestamp of the `frame_index`-th frame, in microseconds.
pub(crate) fn compute_presentation_time(frame_index: u64, frame_rate: u32) -> i64 {
    PTS_OFFSET_US + (frame_index as i64) * 1_000_000 / i64::from(frame_rate)
}

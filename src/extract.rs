//! Frame extraction pipeline — pull selected still frames out of a video.
//!
//! This module provides [`FrameExtractor`], which feeds compressed samples
//! from a demuxer into a hardware decoder, drains decoded frames in order,
//! and persists the frames whose decode index matches a requested timestamp.
//!
//! An asynchronous decoder cannot seek, so the requested timestamps are
//! converted up front into frame indices (see [`crate::selector`]) and the
//! loop counts decoded frames until end-of-stream. Wanted frames take the
//! GPU read-back path: wait for the surface to receive the frame, render and
//! convert, read the pixels back, and save them as a JPEG named by a
//! sequential counter (`frame-000.jpg`, `frame-001.jpg`, …).
//!
//! # Example
//!
//! ```no_run
//! use framepipe::{ExtractRequest, FrameExtractor, PipelineError};
//! # use framepipe::{CodecProvider, ReadbackSurface, SampleSource};
//! # fn demo(
//! #     source: Box<dyn SampleSource>,
//! #     provider: &dyn CodecProvider,
//! #     surface: Box<dyn ReadbackSurface>,
//! # ) -> Result<(), PipelineError> {
//! let request = ExtractRequest::new("frames_out", vec![0.0, 0.5, 1.0]).quality(90);
//! let summary = FrameExtractor::new(request).extract(source, provider, surface)?;
//! println!("saved {} frames", summary.saved.len());
//! # Ok(())
//! # }
//! ```

use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    codec::{CodecProvider, DecoderDevice, OutputEvent, SampleSource, VideoTrackInfo},
    error::PipelineError,
    progress::{CancellationToken, NoOpProgress, ProgressSink, ProgressTracker},
    selector::RequestedFrames,
    surface::{ReadbackSurface, save_jpeg},
};

/// Poll timeout for decoder input/output dequeues. Short so a pending
/// cancellation is observed promptly.
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(10);

/// What to extract and where to put it.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExtractRequest {
    /// Requested frame times in seconds from stream start.
    pub times_sec: Vec<f64>,
    /// Directory the saved frames are written into (created if missing).
    pub output_dir: PathBuf,
    /// JPEG quality, 1–100.
    pub quality: u8,
}

impl ExtractRequest {
    /// Request the frames at `times_sec`, saved into `output_dir` at full
    /// quality.
    pub fn new<P: Into<PathBuf>>(output_dir: P, times_sec: Vec<f64>) -> Self {
        Self {
            times_sec,
            output_dir: output_dir.into(),
            quality: 100,
        }
    }

    /// Set the JPEG quality (1–100).
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }
}

/// Result of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    /// Paths of the frames saved, in save order.
    pub saved: Vec<PathBuf>,
    /// Number of frames decoded before the run ended.
    pub decoded: u64,
    /// Whether the run was ended early by cancellation. A cancelled run is
    /// not a failure; already-saved frames are kept.
    pub cancelled: bool,
}

/// A frame extraction run.
///
/// Per run: `Idle → Extracting → (Completed | Cancelled | Failed)`. Create
/// with [`new`](FrameExtractor::new), optionally attach a progress sink and
/// cancellation token, then call [`extract`](FrameExtractor::extract) (or
/// [`spawn`](FrameExtractor::spawn) to run on a dedicated thread).
pub struct FrameExtractor {
    request: ExtractRequest,
    sink: Arc<dyn ProgressSink>,
    token: CancellationToken,
}

impl FrameExtractor {
    /// Create an extractor for the given request.
    pub fn new(request: ExtractRequest) -> Self {
        Self {
            request,
            sink: Arc::new(NoOpProgress),
            token: CancellationToken::new(),
        }
    }

    /// Attach a progress sink.
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Run the decoder drain loop to completion on the calling thread.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NoVideoTrack`] if the source has no video track.
    /// - [`PipelineError::NoCodecFound`] if no decoder advertises the
    ///   track's mime type.
    /// - [`PipelineError::CodecProtocol`] on an unexpected decoder status.
    /// - I/O and image errors while persisting frames.
    pub fn extract(
        &self,
        mut source: Box<dyn SampleSource>,
        provider: &dyn CodecProvider,
        mut surface: Box<dyn ReadbackSurface>,
    ) -> Result<ExtractSummary, PipelineError> {
        let track = source
            .video_track()
            .ok_or(PipelineError::NoVideoTrack)?
            .clone();

        let mut decoder =
            provider
                .video_decoder(&track.mime_type)
                .ok_or_else(|| PipelineError::NoCodecFound {
                    mime: track.mime_type.clone(),
                })?;

        let result = self.run_loop(&mut *source, &mut *decoder, &mut *surface, &track);

        // Resource release happens unconditionally on every exit path.
        decoder.release();
        surface.release();
        source.release();

        result
    }

    /// Run the extraction on a dedicated thread, so the caller's thread is
    /// never blocked by codec I/O.
    pub fn spawn(
        self,
        source: Box<dyn SampleSource>,
        provider: Arc<dyn CodecProvider + Send + Sync>,
        surface: Box<dyn ReadbackSurface>,
    ) -> ExtractionHandle {
        let token = self.token.clone();
        let worker =
            thread::spawn(move || self.extract(source, provider.as_ref(), surface));
        ExtractionHandle { worker, token }
    }

    fn run_loop(
        &self,
        source: &mut dyn SampleSource,
        decoder: &mut dyn DecoderDevice,
        surface: &mut dyn ReadbackSurface,
        track: &VideoTrackInfo,
    ) -> Result<ExtractSummary, PipelineError> {
        let total_frames = track.total_frames();
        let requested = RequestedFrames::from_times(&self.request.times_sec, track.frame_rate);
        log::info!(
            "Extracting {} of ~{total_frames} frames from a {}x{} {} stream @ {} fps",
            requested.len(),
            track.width,
            track.height,
            track.mime_type,
            track.frame_rate,
        );

        decoder.configure(track)?;
        fs::create_dir_all(&self.request.output_dir)?;

        let mut tracker = ProgressTracker::new(Arc::clone(&self.sink));
        let mut saved: Vec<PathBuf> = Vec::new();
        let mut decode_count: u64 = 0;
        let mut input_done = false;
        let mut output_done = false;
        let mut cancelled = false;

        while !output_done {
            if self.token.is_cancelled() {
                log::info!("Extraction cancelled after {decode_count} decoded frames");
                cancelled = true;
                break;
            }

            // Feed more data to the decoder.
            if !input_done {
                if let Some(slot) = decoder.dequeue_input(DEQUEUE_TIMEOUT)? {
                    match source.next_sample()? {
                        Some(sample) => {
                            decoder.submit_input(slot, &sample.data, sample.pts_us, false)?;
                            log::debug!(
                                "Submitted sample to decoder ({} bytes, pts {}µs)",
                                sample.data.len(),
                                sample.pts_us,
                            );
                        }
                        None => {
                            decoder.submit_input(slot, &[], 0, true)?;
                            input_done = true;
                            log::debug!("Sent decoder end-of-stream");
                        }
                    }
                } else {
                    log::debug!("Decoder input not available, retrying");
                }
            }

            // Drain at most one decoded frame.
            match decoder.dequeue_output(DEQUEUE_TIMEOUT)? {
                OutputEvent::TryAgain => {
                    log::debug!("No output from decoder available");
                }
                OutputEvent::FormatChanged(descriptor) => {
                    // Informational only on the decode path.
                    log::info!(
                        "Decoder output format changed: {}x{}",
                        descriptor.width,
                        descriptor.height,
                    );
                }
                OutputEvent::Sample(sample) => {
                    if sample.info.end_of_stream {
                        output_done = true;
                        log::debug!("Decoder output end-of-stream");
                    }

                    // An empty sample carries no picture and must not be
                    // forwarded to the surface.
                    let render = sample.size != 0;
                    decoder.release_output(sample.buffer, render)?;

                    if render {
                        if requested.contains(decode_count) {
                            let path = self.save_frame(surface, saved.len())?;
                            log::debug!("Saved decode index {decode_count} to {}", path.display());
                            saved.push(path);
                        }

                        let percent = frame_percent(decode_count, total_frames);
                        tracker.emit(percent, None, saved.last().cloned());

                        if decode_count < total_frames {
                            decode_count += 1;
                        }
                    }
                }
            }
        }

        tracker.emit(
            frame_percent(decode_count, total_frames),
            Some(format!("total saved frames = {}", saved.len())),
            None,
        );

        Ok(ExtractSummary {
            saved,
            decoded: decode_count,
            cancelled,
        })
    }

    /// Read the frame currently on the surface back and persist it, named by
    /// the sequential save counter rather than the decode index.
    fn save_frame(
        &self,
        surface: &mut dyn ReadbackSurface,
        save_counter: usize,
    ) -> Result<PathBuf, PipelineError> {
        surface.await_frame()?;
        surface.render_frame()?;
        let pixels = surface.read_pixels()?;

        let path = self
            .request
            .output_dir
            .join(format!("frame-{save_counter:03}.jpg"));
        save_jpeg(&pixels, &path, self.request.quality)?;
        Ok(path)
    }
}

/// Handle to an extraction running on its own thread.
pub struct ExtractionHandle {
    worker: JoinHandle<Result<ExtractSummary, PipelineError>>,
    token: CancellationToken,
}

impl ExtractionHandle {
    /// Request cancellation of the running extraction.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Block until the extraction finishes and return its result.
    pub fn join(self) -> Result<ExtractSummary, PipelineError> {
        self.worker
            .join()
            .unwrap_or_else(|_| Err(PipelineError::ExtractError("worker panicked".to_string())))
    }
}

fn frame_percent(decode_count: u64, total_frames: u64) -> u8 {
    if total_frames == 0 {
        return 0;
    }
    ((decode_count * 100 / total_frames).min(100)) as u8
}

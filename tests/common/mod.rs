//! Shared test doubles for the codec, muxer, demuxer, and read-back
//! capabilities.
//!
//! The mock encoder/decoder follow the asynchronous buffer-exchange protocol
//! faithfully: one reusable output buffer, a format-changed event before the
//! first sample, `TryAgain` when idle, and an empty end-of-stream sample
//! after flush.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use framepipe::{
    CodecProvider, ColorLayout, CompressedSample, ComposerCallback, ContainerMuxer, DecoderDevice,
    DequeuedSample, EncoderDevice, EncoderFormat, OutputEvent, PipelineError, Progress,
    ProgressSink, ReadbackSurface, SampleInfo, SampleSource, TrackDescriptor, VideoTrackInfo,
};
use image::RgbaImage;

// ── Encoder ────────────────────────────────────────────────────────

/// Everything the mock encoder observed, shared with the test body.
#[derive(Default)]
pub struct EncoderLog {
    pub submitted_pts: Vec<i64>,
    pub eos_submitted: bool,
    pub released: bool,
}

struct PendingSample {
    bytes: Vec<u8>,
    info: SampleInfo,
}

pub struct MockEncoder {
    layouts: Vec<ColorLayout>,
    log: Arc<Mutex<EncoderLog>>,
    format: Option<EncoderFormat>,
    pending: VecDeque<PendingSample>,
    buffer: Vec<u8>,
    format_changes_to_send: u32,
    eos_queued: bool,
    frame_count: u64,
}

impl MockEncoder {
    fn new(layouts: Vec<ColorLayout>, log: Arc<Mutex<EncoderLog>>, format_changes: u32) -> Self {
        Self {
            layouts,
            log,
            format: None,
            pending: VecDeque::new(),
            buffer: Vec::new(),
            format_changes_to_send: format_changes,
            eos_queued: false,
            frame_count: 0,
        }
    }

    fn descriptor(&self) -> TrackDescriptor {
        let format = self.format.as_ref().expect("encoder not configured");
        TrackDescriptor {
            mime_type: format.mime_type.clone(),
            width: format.width,
            height: format.height,
            max_sample_size: 3000 * 3000,
        }
    }
}

impl EncoderDevice for MockEncoder {
    fn supported_layouts(&self) -> Vec<ColorLayout> {
        self.layouts.clone()
    }

    fn configure(&mut self, format: &EncoderFormat) -> Result<(), PipelineError> {
        self.format = Some(format.clone());
        Ok(())
    }

    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<usize>, PipelineError> {
        Ok(Some(0))
    }

    fn submit_input(
        &mut self,
        _slot: usize,
        data: &[u8],
        pts_us: i64,
        end_of_stream: bool,
    ) -> Result<(), PipelineError> {
        if end_of_stream {
            self.log.lock().unwrap().eos_submitted = true;
            self.eos_queued = true;
            return Ok(());
        }
        self.log.lock().unwrap().submitted_pts.push(pts_us);

        // "Encode": a deterministic payload derived from the input.
        let mut bytes = pts_us.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(data.len() as u64).to_le_bytes());
        self.pending.push_back(PendingSample {
            bytes,
            info: SampleInfo {
                pts_us,
                key_frame: self.frame_count == 0,
                end_of_stream: false,
                config_only: false,
            },
        });
        self.frame_count += 1;
        Ok(())
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> Result<OutputEvent, PipelineError> {
        if self.format_changes_to_send > 0 && (!self.pending.is_empty() || self.eos_queued) {
            self.format_changes_to_send -= 1;
            return Ok(OutputEvent::FormatChanged(self.descriptor()));
        }
        if let Some(sample) = self.pending.pop_front() {
            self.buffer = sample.bytes;
            return Ok(OutputEvent::Sample(DequeuedSample {
                buffer: 0,
                offset: 0,
                size: self.buffer.len(),
                info: sample.info,
            }));
        }
        if self.eos_queued {
            self.eos_queued = false;
            return Ok(OutputEvent::Sample(DequeuedSample {
                buffer: 0,
                offset: 0,
                size: 0,
                info: SampleInfo {
                    pts_us: 0,
                    key_frame: false,
                    end_of_stream: true,
                    config_only: false,
                },
            }));
        }
        Ok(OutputEvent::TryAgain)
    }

    fn output_bytes(&self, _buffer: usize) -> &[u8] {
        &self.buffer
    }

    fn release_output(&mut self, _buffer: usize) -> Result<(), PipelineError> {
        Ok(())
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released = true;
    }
}

// ── Decoder ────────────────────────────────────────────────────────

pub struct MockDecoder {
    track: Option<VideoTrackInfo>,
    pending: VecDeque<CompressedSample>,
    format_sent: bool,
    eos_queued: bool,
}

impl MockDecoder {
    fn new() -> Self {
        Self {
            track: None,
            pending: VecDeque::new(),
            format_sent: false,
            eos_queued: false,
        }
    }
}

impl DecoderDevice for MockDecoder {
    fn configure(&mut self, track: &VideoTrackInfo) -> Result<(), PipelineError> {
        self.track = Some(track.clone());
        Ok(())
    }

    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<usize>, PipelineError> {
        Ok(Some(0))
    }

    fn submit_input(
        &mut self,
        _slot: usize,
        data: &[u8],
        pts_us: i64,
        end_of_stream: bool,
    ) -> Result<(), PipelineError> {
        if end_of_stream {
            self.eos_queued = true;
        } else {
            self.pending.push_back(CompressedSample {
                data: data.to_vec(),
                pts_us,
                key_frame: false,
            });
        }
        Ok(())
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> Result<OutputEvent, PipelineError> {
        let track = self.track.as_ref().expect("decoder not configured");
        if !self.format_sent {
            self.format_sent = true;
            return Ok(OutputEvent::FormatChanged(TrackDescriptor {
                mime_type: track.mime_type.clone(),
                width: track.width,
                height: track.height,
                max_sample_size: 0,
            }));
        }
        if let Some(sample) = self.pending.pop_front() {
            let size = (track.width * track.height) as usize;
            return Ok(OutputEvent::Sample(DequeuedSample {
                buffer: 0,
                offset: 0,
                size,
                info: SampleInfo::frame(sample.pts_us),
            }));
        }
        if self.eos_queued {
            self.eos_queued = false;
            return Ok(OutputEvent::Sample(DequeuedSample {
                buffer: 0,
                offset: 0,
                size: 0,
                info: SampleInfo {
                    pts_us: 0,
                    key_frame: false,
                    end_of_stream: true,
                    config_only: false,
                },
            }));
        }
        Ok(OutputEvent::TryAgain)
    }

    fn release_output(&mut self, _buffer: usize, _render: bool) -> Result<(), PipelineError> {
        Ok(())
    }

    fn release(&mut self) {}
}

// ── Provider ───────────────────────────────────────────────────────

pub struct MockProvider {
    pub known_mimes: Vec<String>,
    pub layouts: Vec<ColorLayout>,
    pub encoder_log: Arc<Mutex<EncoderLog>>,
    /// Number of format-changed events the encoder emits (normal is 1).
    pub format_changes: u32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            known_mimes: vec!["video/avc".to_string()],
            layouts: vec![ColorLayout::SemiPlanar, ColorLayout::Planar],
            encoder_log: Arc::new(Mutex::new(EncoderLog::default())),
            format_changes: 1,
        }
    }
}

impl CodecProvider for MockProvider {
    fn video_encoder(&self, mime_type: &str) -> Option<Box<dyn EncoderDevice>> {
        if !self.known_mimes.iter().any(|m| m == mime_type) {
            return None;
        }
        Some(Box::new(MockEncoder::new(
            self.layouts.clone(),
            Arc::clone(&self.encoder_log),
            self.format_changes,
        )))
    }

    fn video_decoder(&self, mime_type: &str) -> Option<Box<dyn DecoderDevice>> {
        if !self.known_mimes.iter().any(|m| m == mime_type) {
            return None;
        }
        Some(Box::new(MockDecoder::new()))
    }
}

/// A provider whose encoder panics on the first submitted frame, standing in
/// for a capability hitting an unrecoverable device fault mid-run.
pub struct PanickingProvider;

struct PanickingEncoder;

impl EncoderDevice for PanickingEncoder {
    fn supported_layouts(&self) -> Vec<ColorLayout> {
        vec![ColorLayout::SemiPlanar]
    }

    fn configure(&mut self, _format: &EncoderFormat) -> Result<(), PipelineError> {
        Ok(())
    }

    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<usize>, PipelineError> {
        Ok(Some(0))
    }

    fn submit_input(
        &mut self,
        _slot: usize,
        _data: &[u8],
        _pts_us: i64,
        _end_of_stream: bool,
    ) -> Result<(), PipelineError> {
        panic!("simulated device fault");
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> Result<OutputEvent, PipelineError> {
        Ok(OutputEvent::TryAgain)
    }

    fn output_bytes(&self, _buffer: usize) -> &[u8] {
        &[]
    }

    fn release_output(&mut self, _buffer: usize) -> Result<(), PipelineError> {
        Ok(())
    }

    fn release(&mut self) {}
}

impl CodecProvider for PanickingProvider {
    fn video_encoder(&self, _mime_type: &str) -> Option<Box<dyn EncoderDevice>> {
        Some(Box::new(PanickingEncoder))
    }

    fn video_decoder(&self, _mime_type: &str) -> Option<Box<dyn DecoderDevice>> {
        None
    }
}

// ── Muxer ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MuxLog {
    pub events: Vec<String>,
    pub sample_pts: Vec<i64>,
}

pub struct MockMuxer {
    path: PathBuf,
    file: Option<File>,
    log: Arc<Mutex<MuxLog>>,
}

impl MockMuxer {
    /// Create the output file up front, like a real muxer would.
    pub fn create(path: &Path, log: Arc<Mutex<MuxLog>>) -> Result<Self, PipelineError> {
        let file = File::create(path).map_err(|e| PipelineError::ContainerOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            log,
        })
    }
}

impl ContainerMuxer for MockMuxer {
    fn add_track(&mut self, _descriptor: &TrackDescriptor) -> Result<usize, PipelineError> {
        self.log.lock().unwrap().events.push("add_track".to_string());
        Ok(0)
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        self.log.lock().unwrap().events.push("start".to_string());
        Ok(())
    }

    fn write_sample(
        &mut self,
        _track: usize,
        data: &[u8],
        info: &SampleInfo,
    ) -> Result<(), PipelineError> {
        let mut log = self.log.lock().unwrap();
        log.events.push("write_sample".to_string());
        log.sample_pts.push(info.pts_us);
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)?;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), PipelineError> {
        self.log.lock().unwrap().events.push("release".to_string());
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }
}

// ── Demuxer ────────────────────────────────────────────────────────

pub struct MockSource {
    track: Option<VideoTrackInfo>,
    samples: VecDeque<CompressedSample>,
}

impl MockSource {
    /// A source whose track yields `frames` compressed samples.
    pub fn with_frames(track: VideoTrackInfo, frames: u64) -> Self {
        let samples = (0..frames)
            .map(|i| CompressedSample {
                data: vec![0xAB; 64],
                pts_us: (i as i64) * 1_000_000 / i64::from(track.frame_rate),
                key_frame: i == 0,
            })
            .collect();
        Self {
            track: Some(track),
            samples,
        }
    }

    /// A source with no video track at all.
    pub fn without_video() -> Self {
        Self {
            track: None,
            samples: VecDeque::new(),
        }
    }
}

impl SampleSource for MockSource {
    fn video_track(&self) -> Option<&VideoTrackInfo> {
        self.track.as_ref()
    }

    fn next_sample(&mut self) -> Result<Option<CompressedSample>, PipelineError> {
        Ok(self.samples.pop_front())
    }

    fn release(&mut self) {}
}

/// A 30 fps, 2-second, 64x48 test track.
pub fn test_track() -> VideoTrackInfo {
    VideoTrackInfo {
        mime_type: "video/avc".to_string(),
        width: 64,
        height: 48,
        frame_rate: 30,
        duration_us: 2_000_000,
    }
}

// ── Surface ────────────────────────────────────────────────────────

pub struct MockSurface {
    width: u32,
    height: u32,
    pub awaited: u64,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            awaited: 0,
        }
    }
}

impl ReadbackSurface for MockSurface {
    fn await_frame(&mut self) -> Result<(), PipelineError> {
        self.awaited += 1;
        Ok(())
    }

    fn render_frame(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }

    fn read_pixels(&mut self) -> Result<RgbaImage, PipelineError> {
        Ok(RgbaImage::from_pixel(
            self.width,
            self.height,
            image::Rgba([200, 30, 30, 255]),
        ))
    }

    fn release(&mut self) {}
}

// ── Progress / callback recorders ──────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub snapshots: Mutex<Vec<Progress>>,
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, progress: &Progress) {
        self.snapshots.lock().unwrap().push(progress.clone());
    }
}

#[derive(Default)]
pub struct CallbackLog {
    pub completed: Mutex<Option<PathBuf>>,
    pub failed: Mutex<Option<String>>,
}

impl ComposerCallback for CallbackLog {
    fn on_complete(&self, output: &Path) {
        *self.completed.lock().unwrap() = Some(output.to_path_buf());
    }

    fn on_failed(&self, error: &PipelineError) {
        *self.failed.lock().unwrap() = Some(error.to_string());
    }
}

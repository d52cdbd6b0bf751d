//! Abstract hardware codec and demuxer capabilities.
//!
//! The hardware codec is out of scope for this crate: it is consumed as a
//! capability that accepts configuration, exchanges buffers through a
//! queue/dequeue protocol, and signals format changes and end-of-stream.
//! These traits provide a neutral home for that protocol so the drain loops
//! in [`encode`](crate::encode) and [`extract`](crate::extract) can be
//! exercised against any backing — a platform codec, a software shim, or a
//! test double.
//!
//! The drain protocol is expressed as the tagged union [`OutputEvent`]
//! rather than integer status codes, so exhaustive handling is checked at
//! compile time. `TryAgain` is expected transient backpressure, never an
//! error.

use std::time::Duration;

use crate::{
    config::{ColorLayout, MediaConfig},
    error::PipelineError,
};

/// Configuration handed to an encoder device before it starts.
///
/// Combines the caller's [`MediaConfig`] with the frame geometry and the
/// pixel layout resolved against the device's capabilities.
#[derive(Debug, Clone)]
pub struct EncoderFormat {
    /// Mime type of the encoded stream.
    pub mime_type: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average bit rate in bits per second.
    pub bit_rate: u32,
    /// Frame rate in frames per second.
    pub frame_rate: u32,
    /// Maximum seconds between key frames.
    pub key_frame_interval: u32,
    /// The negotiated input pixel layout.
    pub layout: ColorLayout,
}

impl EncoderFormat {
    /// Build an encoder format from a resolved configuration and geometry.
    pub fn from_config(config: &MediaConfig, width: u32, height: u32, layout: ColorLayout) -> Self {
        Self {
            mime_type: config.mime_type.clone(),
            width,
            height,
            bit_rate: config.bit_rate,
            frame_rate: config.frame_rate,
            key_frame_interval: config.key_frame_interval,
            layout,
        }
    }
}

/// Container-level track metadata.
///
/// Produced exactly once by the encoder's initial format-changed event and
/// required before the muxer accepts samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Codec mime type of the track.
    pub mime_type: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Upper bound on the size of a single sample, in bytes.
    pub max_sample_size: usize,
}

/// Metadata attached to one encoded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInfo {
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
    /// Whether the sample is independently decodable.
    pub key_frame: bool,
    /// Whether this sample carries the end-of-stream marker.
    pub end_of_stream: bool,
    /// Whether the sample holds codec configuration data rather than frame
    /// data. Config samples are consumed by the track descriptor, not the
    /// muxer.
    pub config_only: bool,
}

impl SampleInfo {
    /// A plain frame sample at the given timestamp.
    pub fn frame(pts_us: i64) -> Self {
        Self {
            pts_us,
            key_frame: false,
            end_of_stream: false,
            config_only: false,
        }
    }
}

/// A sample dequeued from a codec's output side.
///
/// `buffer` names a reusable codec-owned buffer; the byte range is valid
/// only between dequeue and [`release_output`](EncoderDevice::release_output)
/// and must not be retained past release.
#[derive(Debug, Clone, Copy)]
pub struct DequeuedSample {
    /// Index of the codec-owned buffer holding the bytes.
    pub buffer: usize,
    /// Byte offset of the sample within the buffer.
    pub offset: usize,
    /// Length of the sample in bytes.
    pub size: usize,
    /// Sample metadata.
    pub info: SampleInfo,
}

/// One result of polling a codec's output side.
#[derive(Debug, Clone)]
pub enum OutputEvent {
    /// No output available yet; retry on the next loop iteration.
    TryAgain,
    /// The negotiated output format is now known.
    FormatChanged(TrackDescriptor),
    /// A sample is available for reading.
    Sample(DequeuedSample),
}

/// An asynchronous hardware video encoder reached through the buffer
/// exchange protocol.
///
/// Blocking calls take short timeouts so a pending cancellation is observed
/// promptly rather than after an unbounded wait. The handle is exclusively
/// owned by the encoder drain loop for the loop's lifetime.
pub trait EncoderDevice: Send {
    /// The YUV 4:2:0 layouts this encoder accepts as input.
    fn supported_layouts(&self) -> Vec<ColorLayout>;

    /// Configure and start the encoder.
    fn configure(&mut self, format: &EncoderFormat) -> Result<(), PipelineError>;

    /// Poll for a free input slot. `None` means no slot within the timeout.
    fn dequeue_input(&mut self, timeout: Duration) -> Result<Option<usize>, PipelineError>;

    /// Submit raw frame bytes (or an empty end-of-stream marker) to a
    /// previously dequeued input slot.
    fn submit_input(
        &mut self,
        slot: usize,
        data: &[u8],
        pts_us: i64,
        end_of_stream: bool,
    ) -> Result<(), PipelineError>;

    /// Poll the output side for the next event.
    fn dequeue_output(&mut self, timeout: Duration) -> Result<OutputEvent, PipelineError>;

    /// View the bytes of a codec-owned output buffer.
    fn output_bytes(&self, buffer: usize) -> &[u8];

    /// Return an output buffer to the codec for reuse.
    fn release_output(&mut self, buffer: usize) -> Result<(), PipelineError>;

    /// Stop the encoder and release its resources. Called unconditionally on
    /// every exit path.
    fn release(&mut self);
}

/// An asynchronous hardware video decoder rendering into an attached
/// surface.
///
/// Mirrors [`EncoderDevice`] on the input side; on the output side a decoded
/// frame is handed to the render surface when released with `render = true`.
pub trait DecoderDevice: Send {
    /// Configure the decoder from the source track and start it.
    fn configure(&mut self, track: &VideoTrackInfo) -> Result<(), PipelineError>;

    /// Poll for a free input slot. `None` means no slot within the timeout.
    fn dequeue_input(&mut self, timeout: Duration) -> Result<Option<usize>, PipelineError>;

    /// Submit one compressed sample (or an empty end-of-stream marker).
    fn submit_input(
        &mut self,
        slot: usize,
        data: &[u8],
        pts_us: i64,
        end_of_stream: bool,
    ) -> Result<(), PipelineError>;

    /// Poll the output side for the next event. A decoder's `FormatChanged`
    /// is informational only.
    fn dequeue_output(&mut self, timeout: Duration) -> Result<OutputEvent, PipelineError>;

    /// Release a decoded output buffer, optionally forwarding it to the
    /// render surface.
    fn release_output(&mut self, buffer: usize, render: bool) -> Result<(), PipelineError>;

    /// Stop the decoder and release its resources. Called unconditionally on
    /// every exit path.
    fn release(&mut self);
}

/// Factory for codec handles, keyed by mime type.
pub trait CodecProvider {
    /// Create an encoder for the given mime type, or `None` if no capability
    /// advertises it.
    fn video_encoder(&self, mime_type: &str) -> Option<Box<dyn EncoderDevice>>;

    /// Create a decoder for the given mime type, or `None` if no capability
    /// advertises it.
    fn video_decoder(&self, mime_type: &str) -> Option<Box<dyn DecoderDevice>>;
}

/// Metadata of the video track selected from a demuxed container.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoTrackInfo {
    /// Track mime type (must start with `video/`).
    pub mime_type: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate in frames per second.
    pub frame_rate: u32,
    /// Stream duration in microseconds.
    pub duration_us: i64,
}

impl VideoTrackInfo {
    /// Total frame count implied by duration and frame rate.
    pub fn total_frames(&self) -> u64 {
        (self.duration_us.max(0) as u64) * u64::from(self.frame_rate) / 1_000_000
    }
}

/// One compressed sample read from a demuxer.
#[derive(Debug, Clone)]
pub struct CompressedSample {
    /// Compressed bitstream bytes.
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
    /// Whether the sample is a key frame.
    pub key_frame: bool,
}

/// Demuxed compressed samples from an opened container, in decode order.
///
/// Implementations open the container up front and surface
/// [`PipelineError::SourceUnreadable`] from their constructor.
pub trait SampleSource: Send {
    /// The selected video track, or `None` if the container has no track
    /// with a video mime type.
    fn video_track(&self) -> Option<&VideoTrackInfo>;

    /// Read the next compressed sample, or `None` at end of stream.
    fn next_sample(&mut self) -> Result<Option<CompressedSample>, PipelineError>;

    /// Release the demuxer. Called unconditionally on every exit path.
    fn release(&mut self);
}

//! # framepipe
//!
//! Extract still frames from a compressed video and re-encode sequences of
//! still frames back into a compressed video, through a hardware codec
//! reached over an asynchronous buffer-exchange protocol.
//!
//! The codec, container multiplexer, demuxer, and GPU read-back surface are
//! *capabilities* supplied by the caller (see [`CodecProvider`],
//! [`ContainerMuxer`], [`SampleSource`], [`ReadbackSurface`]); `framepipe`
//! owns the hard part in the middle — the drain loops that feed them,
//! convert pixels, select frames by timestamp, and stay cancellable while
//! reporting progress.
//!
//! ## Compose a video from frames
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepipe::{
//!     CancellationToken, Frame, MediaConfig, NoOpProgress, VideoComposer,
//! };
//! # use framepipe::{CodecProvider, ComposerCallback, ContainerMuxer, PipelineError};
//! # fn demo(
//! #     provider: &dyn CodecProvider,
//! #     muxer: Box<dyn ContainerMuxer>,
//! #     callback: Arc<dyn ComposerCallback>,
//! # ) -> Result<(), PipelineError> {
//! let mut composer = VideoComposer::configure(
//!     MediaConfig::new(),
//!     1920,
//!     1080,
//!     "out.mp4",
//!     provider,
//!     muxer,
//! )?;
//! composer.start(Arc::new(NoOpProgress), CancellationToken::new(), callback);
//! composer.enqueue_frame(Frame::solid(1920, 1080, 0xFF336699));
//! composer.stop();
//! composer.wait();
//! # Ok(())
//! # }
//! ```
//!
//! ## Extract frames from a video
//!
//! ```no_run
//! use framepipe::{ExtractRequest, FrameExtractor};
//! # use framepipe::{CodecProvider, PipelineError, ReadbackSurface, SampleSource};
//! # fn demo(
//! #     source: Box<dyn SampleSource>,
//! #     provider: &dyn CodecProvider,
//! #     surface: Box<dyn ReadbackSurface>,
//! # ) -> Result<(), PipelineError> {
//! let request = ExtractRequest::new("frames", vec![0.0, 6.34]).quality(80);
//! let summary = FrameExtractor::new(request).extract(source, provider, surface)?;
//! assert_eq!(summary.saved.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design notes
//!
//! - Both drain loops run on a dedicated thread each; the caller's thread is
//!   never blocked by codec I/O.
//! - The encode loop is strictly sequential per frame (convert, submit,
//!   drain) — encoder timestamp order is a correctness requirement.
//! - Cancellation is cooperative, checked once per loop iteration; codec
//!   polls use short timeouts so a pending cancellation is observed
//!   promptly.
//! - Codec "try again later" is modelled as [`OutputEvent::TryAgain`], an
//!   expected backpressure signal rather than an error.

pub mod codec;
pub mod config;
pub mod encode;
pub mod error;
pub mod extract;
pub mod frame;
pub mod muxer;
pub mod progress;
pub mod selector;
pub mod surface;
pub mod yuv;

pub use codec::{
    CodecProvider, CompressedSample, DecoderDevice, DequeuedSample, EncoderDevice, EncoderFormat,
    OutputEvent, SampleInfo, SampleSource, TrackDescriptor, VideoTrackInfo,
};
pub use config::{ColorLayout, LAYOUT_PRIORITY, MediaConfig};
pub use encode::{ComposerCallback, VideoComposer};
pub use error::PipelineError;
pub use extract::{ExtractRequest, ExtractSummary, ExtractionHandle, FrameExtractor};
pub use frame::Frame;
pub use muxer::ContainerMuxer;
pub use progress::{CancellationToken, NoOpProgress, Progress, ProgressSink};
pub use selector::{RequestedFrames, frame_indices};
pub use surface::ReadbackSurface;
pub use yuv::convert_frame;

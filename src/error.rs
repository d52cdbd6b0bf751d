//! Error types for the `framepipe` crate.
//!
//! This module defines [`PipelineError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose the problem without additional logging at the call site.
//!
//! Transient codec backpressure ("try again later") is deliberately *not* an
//! error: it is modelled as [`OutputEvent::TryAgain`](crate::OutputEvent) and
//! handled inside the drain loops.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

use crate::config::ColorLayout;

/// The unified error type for all `framepipe` operations.
///
/// Every public method that can fail returns `Result<T, PipelineError>`.
/// Fatal errors bubble to the single completion callback of the run; no
/// partial state is silently swallowed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// No codec capability advertises the requested mime type.
    #[error("No codec found for mime type {mime}")]
    NoCodecFound {
        /// The mime type that was requested (e.g. `video/avc`).
        mime: String,
    },

    /// The caller asked for a pixel layout the negotiated codec does not
    /// support.
    #[error("Codec does not support requested pixel layout {requested:?}")]
    UnsupportedLayout {
        /// The layout named by the caller.
        requested: ColorLayout,
    },

    /// The negotiated codec supports none of the known 4:2:0 layouts.
    #[error("Codec reports no supported YUV 4:2:0 pixel layout")]
    NoLayoutMatch,

    /// The encoding configuration is not usable (e.g. a zero frame rate).
    /// Rejected before any codec or file I/O starts.
    #[error("Invalid encoding configuration: {reason}")]
    InvalidConfig {
        /// What makes the configuration unusable.
        reason: String,
    },

    /// The output container could not be created at the given location.
    #[error("Failed to open output container at {path}: {reason}")]
    ContainerOpenFailed {
        /// Path the container was to be created at.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The input media could not be opened or read.
    #[error("Failed to read media source at {path}: {reason}")]
    SourceUnreadable {
        /// Path that was passed to the demuxer.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The input does not contain a track with a video mime type.
    #[error("No video track found in source")]
    NoVideoTrack,

    /// The codec capability returned a status the drain protocol does not
    /// allow at this point (e.g. a second format change). Fatal for the run:
    /// continuing would desynchronize timestamps.
    #[error("Codec protocol violation: {0}")]
    CodecProtocol(String),

    /// Frame dimensions or pixel buffer are not usable for 4:2:0 conversion.
    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },

    /// A sample was offered to the muxer out of protocol order.
    #[error("Muxer protocol violation: {0}")]
    MuxerOrder(String),

    /// Frame encoding failed inside the composer drain loop.
    #[error("Video composition error: {0}")]
    ComposeError(String),

    /// Frame extraction failed inside the decoder drain loop.
    #[error("Frame extraction error: {0}")]
    ExtractError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while persisting a read-back frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A capability's underlying platform call was interrupted by
    /// cancellation. The pipelines themselves never return this: a run
    /// cancelled via a [`CancellationToken`](crate::CancellationToken) ends
    /// as an abort (encode) or a kept-partial-result summary (extract).
    #[error("Operation cancelled")]
    Cancelled,
}

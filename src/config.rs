//! Encoding configuration.
//!
//! This module provides [`MediaConfig`], the immutable configuration value
//! resolved once before encoding starts, and [`ColorLayout`], the set of
//! YUV 4:2:0 byte layouts the pixel converter can produce.
//!
//! A configuration is built with the fluent setters and then *resolved*
//! against the layouts the negotiated codec reports supporting — after that
//! point nothing about a session's configuration can change, and no session
//! may observe another session's in-flight configuration.
//!
//! # Example
//!
//! ```
//! use framepipe::{ColorLayout, MediaConfig};
//!
//! let config = MediaConfig::new()
//!     .bit_rate(8_000_000)
//!     .frame_rate(25)
//!     .key_frame_interval(2);
//!
//! assert_eq!(config.frame_rate, 25);
//! assert_eq!(config.mime_type, "video/avc");
//!
//! // The codec advertises planar and semi-planar; priority picks semi-planar.
//! let layout = config
//!     .resolve_layout(&[ColorLayout::Planar, ColorLayout::SemiPlanar])
//!     .unwrap();
//! assert_eq!(layout, ColorLayout::SemiPlanar);
//! ```

use crate::error::PipelineError;

/// A YUV 4:2:0 byte layout accepted by a hardware codec.
///
/// The four layouts hold identical sample values and differ only in where
/// the chroma bytes land; see [`convert_frame`](crate::yuv::convert_frame)
/// for the exact byte placement of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLayout {
    /// Y plane, then the full U plane, then the full V plane.
    Planar,
    /// Y plane followed by interleaved chroma pairs (NV-style).
    SemiPlanar,
    /// Chroma interleaved into the luma stream at fixed offsets
    /// (device-specific packed variant).
    PackedSemiPlanar,
    /// Packed variant with a split luma/chroma half-buffer arrangement
    /// (device-specific packed variant).
    PackedPlanar,
}

/// Fixed priority order used when the caller does not name a layout
/// preference: the first entry of this list the codec supports wins.
pub const LAYOUT_PRIORITY: [ColorLayout; 4] = [
    ColorLayout::SemiPlanar,
    ColorLayout::Planar,
    ColorLayout::PackedSemiPlanar,
    ColorLayout::PackedPlanar,
];

/// Immutable encoding configuration, resolved once before encoding starts.
///
/// Defaults match a 30 fps H.264 stream at 16 Mbit/s with one key frame per
/// second.
///
/// # Example
///
/// ```
/// use framepipe::MediaConfig;
///
/// let config = MediaConfig::new().mime_type("video/hevc").frame_rate(60);
/// assert_eq!(config.mime_type, "video/hevc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct MediaConfig {
    /// Mime type of the encoded stream (e.g. `video/avc`).
    pub mime_type: String,
    /// Average bit rate in bits per second.
    pub bit_rate: u32,
    /// Frame rate in frames per second.
    pub frame_rate: u32,
    /// Maximum seconds between independently-decodable frames.
    pub key_frame_interval: u32,
    /// Pixel layout preference. `None` lets [`resolve_layout`]
    /// (MediaConfig::resolve_layout) pick by priority.
    pub layout: Option<ColorLayout>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            mime_type: "video/avc".to_string(),
            bit_rate: 16_000_000,
            frame_rate: 30,
            key_frame_interval: 1,
            layout: None,
        }
    }
}

impl MediaConfig {
    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mime type of the encoded stream.
    pub fn mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the average bit rate in bits per second.
    pub fn bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /// Set the frame rate in frames per second.
    pub fn frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the key frame interval in seconds.
    pub fn key_frame_interval(mut self, seconds: u32) -> Self {
        self.key_frame_interval = seconds;
        self
    }

    /// Name an explicit pixel layout preference.
    pub fn layout(mut self, layout: ColorLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Resolve the pixel layout against the layouts the negotiated codec
    /// reports supporting.
    ///
    /// If the caller named a preference it must be a member of `supported`.
    /// Without a preference the first supported layout in
    /// [`LAYOUT_PRIORITY`] order is chosen.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnsupportedLayout`] if the named preference is not
    ///   supported.
    /// - [`PipelineError::NoLayoutMatch`] if the codec supports none of the
    ///   known layouts.
    pub fn resolve_layout(
        &self,
        supported: &[ColorLayout],
    ) -> Result<ColorLayout, PipelineError> {
        if let Some(requested) = self.layout {
            if supported.contains(&requested) {
                log::debug!("Using caller-requested pixel layout {requested:?}");
                return Ok(requested);
            }
            return Err(PipelineError::UnsupportedLayout { requested });
        }

        let resolved = LAYOUT_PRIORITY
            .iter()
            .copied()
            .find(|layout| supported.contains(layout))
            .ok_or(PipelineError::NoLayoutMatch)?;

        log::debug!("Resolved pixel layout {resolved:?} (codec supports {supported:?})");
        Ok(resolved)
    }
}

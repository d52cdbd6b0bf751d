//! Raw video frames.
//!
//! This module provides [`Frame`], the rectangular ARGB pixel buffer handed
//! to the encoding pipeline or produced by the extraction pipeline. A frame
//! is immutable once constructed: pipelines consume it, convert it, and
//! release it, but never mutate it.

use image::RgbaImage;

use crate::error::PipelineError;

/// A rectangular pixel buffer with 32-bit ARGB pixels.
///
/// Pixels are stored row-major, one `u32` per pixel, `0xAARRGGBB`. The alpha
/// channel is carried but ignored by the pixel converter.
///
/// # Example
///
/// ```
/// use framepipe::Frame;
///
/// let red = Frame::solid(64, 64, 0xFFFF0000);
/// assert_eq!(red.width(), 64);
/// assert_eq!(red.pixels().len(), 64 * 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Frame {
    /// Create a frame from a row-major ARGB pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either dimension is
    /// zero or the buffer length disagrees with `width * height`.
    pub fn from_argb(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 || pixels.len() != (width as usize) * (height as usize) {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a frame filled with a single ARGB color.
    pub fn solid(width: u32, height: u32, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; (width as usize) * (height as usize)],
        }
    }

    /// Create a frame from an [`RgbaImage`] (e.g. a decoded JPEG/PNG still).
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
            })
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The row-major ARGB pixel buffer.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

//! GPU read-back capability and frame persistence.
//!
//! Decoded frames are rendered by the decoder into an opaque GPU surface.
//! For the frames the selector marked as wanted, the extraction loop waits
//! for the surface to receive the frame, has it render/convert to a readable
//! color space, and reads the pixels back into a CPU buffer. Only the
//! orchestration lives here; the rendering itself is an external capability.

use std::{fs::File, io::BufWriter, path::Path};

use image::{RgbaImage, codecs::jpeg::JpegEncoder};

use crate::error::PipelineError;

/// A render surface that converts decoder output to readable RGBA pixels.
///
/// The surface is exclusively owned by the extraction drain loop for the
/// loop's lifetime. The expected call sequence per wanted frame is
/// [`await_frame`](ReadbackSurface::await_frame) →
/// [`render_frame`](ReadbackSurface::render_frame) →
/// [`read_pixels`](ReadbackSurface::read_pixels).
pub trait ReadbackSurface: Send {
    /// Block until the frame most recently released to the surface has been
    /// converted to a texture.
    fn await_frame(&mut self) -> Result<(), PipelineError>;

    /// Render the latest frame and convert it to a readable format.
    fn render_frame(&mut self) -> Result<(), PipelineError>;

    /// Read the rendered pixels back into a CPU buffer.
    fn read_pixels(&mut self) -> Result<RgbaImage, PipelineError>;

    /// Release the surface. Called unconditionally on every exit path.
    fn release(&mut self);
}

/// Persist read-back pixels as a JPEG file at the given quality (1–100).
pub(crate) fn save_jpeg(
    pixels: &RgbaImage,
    path: &Path,
    quality: u8,
) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
    // JPEG has no alpha channel; drop it before encoding.
    let rgb = image::DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
    rgb.write_with_encoder(encoder)?;
    log::debug!("Saved frame to {}", path.display());
    Ok(())
}

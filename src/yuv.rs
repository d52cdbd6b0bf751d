//! ARGB → YUV 4:2:0 pixel conversion.
//!
//! This module implements the pixel converter for the four 4:2:0 byte
//! layouts hardware encoders commonly negotiate. Conversion uses BT.601-style
//! coefficients with 8-bit truncating integer math:
//!
//! ```text
//! Y = ((66*R + 129*G +  25*B + 128) >> 8) + 16
//! U = ((112*R - 94*G -  18*B + 128) >> 8) + 128
//! V = ((-38*R - 74*G + 112*B + 128) >> 8) + 128
//! ```
//!
//! Luma is written for every pixel in row-major order. Chroma is written only
//! when both the row index and the pixel's linear index are even — the
//! even-row, even-column sample of each 2×2 block.
//!
//! Two placement quirks are load-bearing and must not be "corrected":
//! the semi-planar layout interleaves chroma as **V then U** (not the
//! conventional U,V order), and the packed layouts use fixed-offset index
//! arithmetic inherited from specific devices. Each layout is pinned by a
//! golden-buffer test in `tests/yuv_layouts.rs`.

use crate::{config::ColorLayout, error::PipelineError, frame::Frame};

/// One converted pixel, clamped to 0..=255 per channel.
struct YuvPixel {
    y: u8,
    u: u8,
    v: u8,
}

fn clamp(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

fn pixel_to_yuv(argb: u32) -> YuvPixel {
    let r = ((argb >> 16) & 0xff) as i32;
    let g = ((argb >> 8) & 0xff) as i32;
    let b = (argb & 0xff) as i32;

    let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
    let u = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    let v = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;

    YuvPixel {
        y: clamp(y),
        u: clamp(u),
        v: clamp(v),
    }
}

/// Write `value` at `index`, ignoring writes past the end of the buffer.
///
/// Odd dimensions push the packed layouts' chroma offsets past the
/// `w*h*3/2` boundary on the final row; the reference behaviour is to drop
/// those samples rather than grow the buffer.
fn put(buffer: &mut [u8], index: usize, value: u8) {
    if let Some(slot) = buffer.get_mut(index) {
        *slot = value;
    }
}

/// Convert an ARGB frame into the requested YUV 4:2:0 byte layout.
///
/// The returned buffer is exactly `width * height * 3 / 2` bytes (truncating
/// integer math) for every layout.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] if either dimension is zero.
///
/// # Example
///
/// ```
/// use framepipe::{ColorLayout, Frame, convert_frame};
///
/// let frame = Frame::solid(64, 64, 0xFF00FF00);
/// let yuv = convert_frame(&frame, ColorLayout::SemiPlanar).unwrap();
/// assert_eq!(yuv.len(), 64 * 64 * 3 / 2);
/// ```
pub fn convert_frame(frame: &Frame, layout: ColorLayout) -> Result<Vec<u8>, PipelineError> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        });
    }

    let mut buffer = vec![0u8; width * height * 3 / 2];
    match layout {
        ColorLayout::Planar => encode_planar(&mut buffer, frame.pixels(), width, height),
        ColorLayout::SemiPlanar => encode_semi_planar(&mut buffer, frame.pixels(), width, height),
        ColorLayout::PackedSemiPlanar => {
            encode_packed_semi_planar(&mut buffer, frame.pixels(), width, height)
        }
        ColorLayout::PackedPlanar => {
            encode_packed_planar(&mut buffer, frame.pixels(), width, height)
        }
    }
    Ok(buffer)
}

/// Y plane, then all U, then all V (`w*h`, `w*h/4`, `w*h/4`).
///
/// The U plane receives the V samples and vice versa — the swap mirrors the
/// semi-planar V-before-U ordering and is part of the layout contract.
fn encode_planar(buffer: &mut [u8], argb: &[u32], width: usize, height: usize) {
    let frame_size = width * height;

    let mut y_index = 0;
    let mut u_index = frame_size;
    let mut v_index = frame_size + frame_size / 4;

    let mut index = 0;
    for row in 0..height {
        for _ in 0..width {
            let yuv = pixel_to_yuv(argb[index]);

            buffer[y_index] = yuv.y;
            y_index += 1;
            if row % 2 == 0 && index % 2 == 0 {
                put(buffer, v_index, yuv.u);
                v_index += 1;
                put(buffer, u_index, yuv.v);
                u_index += 1;
            }

            index += 1;
        }
    }
}

/// Y plane, then interleaved V,U pairs.
fn encode_semi_planar(buffer: &mut [u8], argb: &[u32], width: usize, height: usize) {
    let frame_size = width * height;

    let mut y_index = 0;
    let mut uv_index = frame_size;

    let mut index = 0;
    for row in 0..height {
        for _ in 0..width {
            let yuv = pixel_to_yuv(argb[index]);

            buffer[y_index] = yuv.y;
            y_index += 1;
            if row % 2 == 0 && index % 2 == 0 {
                put(buffer, uv_index, yuv.v);
                uv_index += 1;
                put(buffer, uv_index, yuv.u);
                uv_index += 1;
            }

            index += 1;
        }
    }
}

/// Chroma interleaved into the luma stream at fixed `+1` / `+3` offsets.
fn encode_packed_semi_planar(buffer: &mut [u8], argb: &[u32], width: usize, height: usize) {
    let mut y_index = 0;

    let mut index = 0;
    for row in 0..height {
        for _ in 0..width {
            let yuv = pixel_to_yuv(argb[index]);

            put(buffer, y_index, yuv.y);
            y_index += 1;
            if row % 2 == 0 && index % 2 == 0 {
                put(buffer, y_index + 1, yuv.v);
                put(buffer, y_index + 3, yuv.u);
            }
            if index % 2 == 0 {
                y_index += 1;
            }

            index += 1;
        }
    }
}

/// Packed variant splitting luma across the buffer halves: even rows land in
/// the first half interleaved with chroma, odd rows in the second half.
fn encode_packed_planar(buffer: &mut [u8], argb: &[u32], width: usize, height: usize) {
    let mut y_index = 0;
    let mut v_index = buffer.len() / 2;

    let mut index = 0;
    for row in 0..height {
        for _ in 0..width {
            let yuv = pixel_to_yuv(argb[index]);

            match (row % 2, index % 2) {
                (0, 0) => {
                    put(buffer, y_index, yuv.y);
                    y_index += 1;
                    put(buffer, y_index + 1, yuv.v);
                    put(buffer, v_index + 1, yuv.u);
                    y_index += 1;
                }
                (0, _) => {
                    put(buffer, y_index, yuv.y);
                    y_index += 1;
                }
                (_, 0) => {
                    put(buffer, v_index, yuv.y);
                    v_index += 2;
                }
                (_, _) => {
                    put(buffer, v_index, yuv.y);
                    v_index += 1;
                }
            }

            index += 1;
        }
    }
}

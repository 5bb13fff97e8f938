// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame QR decoding
//!
//! Runs the rqrr decode engine against one grayscale frame and reduces the
//! attempt to a single outcome. Frames are downscaled to a maximum dimension
//! first to keep per-frame cost bounded at camera framerates.

use crate::decoder::types::{DecodeOutcome, ScanFrame};
use tracing::{debug, trace};

/// Decode one frame
///
/// Exactly one outcome per frame: the first grid that decodes wins. A frame
/// with no detectable grid is `NotFound`; a frame where every detected grid
/// fails to decode is `Failed` with the last engine error.
pub fn decode_frame(frame: &ScanFrame, max_dimension: u32) -> DecodeOutcome {
    let start = std::time::Instant::now();

    let (pixels, width, height) = if frame.width > max_dimension || frame.height > max_dimension {
        let scale = (frame.width as f32 / max_dimension as f32)
            .max(frame.height as f32 / max_dimension as f32);
        let dst_width = ((frame.width as f32 / scale) as u32).max(1);
        let dst_height = ((frame.height as f32 / scale) as u32).max(1);
        (downscale_gray(frame, dst_width, dst_height), dst_width, dst_height)
    } else {
        (frame.data.to_vec(), frame.width, frame.height)
    };

    let Some(image) = image::GrayImage::from_raw(width, height, pixels) else {
        return DecodeOutcome::Failed(format!("frame buffer does not match {}x{}", width, height));
    };

    let mut prepared = rqrr::PreparedImage::prepare(image);
    let grids = prepared.detect_grids();

    trace!(
        count = grids.len(),
        width,
        height,
        detection_ms = start.elapsed().as_millis(),
        "Grid detection complete"
    );

    if grids.is_empty() {
        return DecodeOutcome::NotFound;
    }

    let mut last_error = None;
    for grid in &grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!(
                    content = %content,
                    total_ms = start.elapsed().as_millis(),
                    "Decoded QR code"
                );
                return DecodeOutcome::Decoded(content);
            }
            Err(e) => {
                debug!(error = %e, "Failed to decode detected grid");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => DecodeOutcome::Failed(e.to_string()),
        None => DecodeOutcome::NotFound,
    }
}

/// Downscale a grayscale frame using bilinear interpolation
fn downscale_gray(frame: &ScanFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = frame.width as usize;
    let src_height = frame.height as usize;

    let mut result = Vec::with_capacity((dst_width * dst_height) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    let get_pixel = |px: usize, py: usize| -> f32 {
        frame.data.get(py * src_width + px).copied().unwrap_or(0) as f32
    };

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let p00 = get_pixel(x0, y0);
            let p01 = get_pixel(x1, y0);
            let p10 = get_pixel(x0, y1);
            let p11 = get_pixel(x1, y1);

            let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                + p01 * x_frac * (1.0 - y_frac)
                + p10 * (1.0 - x_frac) * y_frac
                + p11 * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}

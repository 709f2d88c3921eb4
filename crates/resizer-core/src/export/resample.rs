//! Resampling a source sub-rectangle into an exact output size.
//!
//! The sampling region comes from display geometry, so its corners are
//! fractional. The smallest whole-pixel block covering it is scaled by the
//! output/region ratio, then the output is cut from that block at the
//! region's scaled offset. Both axes keep their own exact scale, so a region
//! with the output's aspect ratio is never stretched.

use image::imageops;

use super::ExportError;
use crate::decode::{DecodedImage, FilterType};
use crate::geometry::{Rect, EDGE_TOLERANCE};

/// Largest side of the intermediate block before falling back to a direct
/// block-to-output resize.
const MAX_INTERMEDIATE_SIDE: f64 = 16384.0;

/// Smallest whole-pixel block `(x, y, width, height)` covering `region`,
/// clamped to an image of `image_width x image_height`. Never empty.
pub fn enclosing_pixels(
    region: &Rect,
    image_width: u32,
    image_height: u32,
) -> (u32, u32, u32, u32) {
    let span = |start: f64, end: f64, limit: u32| -> (u32, u32) {
        let limit_f = limit.max(1) as f64;
        let lo = (start + EDGE_TOLERANCE).floor().max(0.0).min(limit_f - 1.0);
        let hi = (end - EDGE_TOLERANCE).ceil().min(limit_f).max(lo + 1.0);
        (lo as u32, (hi - lo) as u32)
    };
    let (x, width) = span(region.x, region.right(), image_width);
    let (y, height) = span(region.y, region.bottom(), image_height);
    (x, y, width, height)
}

/// Resample `region` of `image` (in source pixels) to exactly `width x height`.
///
/// # Errors
///
/// Returns `ExportError::InvalidOutputSize` if either output dimension is
/// zero and `ExportError::EmptySource` if the source or region has no pixels.
pub fn resample_region(
    image: &DecodedImage,
    region: &Rect,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::InvalidOutputSize { width, height });
    }
    if image.is_empty() || region.size().is_empty() {
        return Err(ExportError::EmptySource);
    }

    let (bx, by, bw, bh) = enclosing_pixels(region, image.width, image.height);

    // Fast path: whole image at its own size
    if (bx, by, bw, bh) == (0, 0, image.width, image.height)
        && (width, height) == (image.width, image.height)
    {
        return Ok(image.clone());
    }

    let view = image.as_rgba_image().ok_or(ExportError::EmptySource)?;
    let block = imageops::crop_imm(&view, bx, by, bw, bh);
    let filter = filter.to_image_filter();

    let scale_x = width as f64 / region.width;
    let scale_y = height as f64 / region.height;
    let scaled_w = bw as f64 * scale_x;
    let scaled_h = bh as f64 * scale_y;
    if scaled_w > MAX_INTERMEDIATE_SIDE || scaled_h > MAX_INTERMEDIATE_SIDE {
        log::debug!("region {region:?} too small for exact sampling, resizing block directly");
        let resized = imageops::resize(&*block, width, height, filter);
        return Ok(DecodedImage::from_rgba_image(resized));
    }

    let scaled_w = (scaled_w.round() as u32).max(width);
    let scaled_h = (scaled_h.round() as u32).max(height);
    let scaled = imageops::resize(&*block, scaled_w, scaled_h, filter);
    if (scaled_w, scaled_h) == (width, height) {
        return Ok(DecodedImage::from_rgba_image(scaled));
    }

    let offset = |start: f64, origin: u32, scale: f64, slack: u32| -> u32 {
        let px = ((start - origin as f64) * scale).round().max(0.0) as u32;
        px.min(slack)
    };
    let ox = offset(region.x, bx, scale_x, scaled_w - width);
    let oy = offset(region.y, by, scale_y, scaled_h - height);
    let output = imageops::crop_imm(&scaled, ox, oy, width, height).to_image();

    Ok(DecodedImage::from_rgba_image(output))
}

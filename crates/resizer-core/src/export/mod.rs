//! Export of a tab's crop as a fixed-size PNG.
//!
//! # Algorithm
//!
//! 1. Take the effective render scale (display pixels per source pixel).
//! 2. Find the rendered image's top-left corner in container coordinates.
//! 3. Subtract it from the crop rectangle's top-left and divide by the scale,
//!    giving the crop origin in source pixels.
//! 4. Divide the crop rectangle's size by the scale, giving the sampling size.
//! 5. Resample that region into exactly `width x height` output pixels.
//! 6. Encode as PNG and write it.
//!
//! The crop rectangle always has the configured output aspect ratio, so step 5
//! is a uniform resize and never distorts.
//!
//! Exporting a tab without an image or without a laid-out container is a
//! no-op and reports [`ExportOutcome::Skipped`].

mod resample;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::decode::{DecodedImage, FilterType};
use crate::encode::{write_png, EncodeError};
use crate::geometry::Rect;
use crate::viewport::Viewport;

pub use resample::{enclosing_pixels, resample_region};

/// Errors that can occur while exporting a crop.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Requested output has a zero dimension
    #[error("Invalid output size {width}x{height}")]
    InvalidOutputSize { width: u32, height: u32 },

    /// Source bitmap has no pixels
    #[error("Source image is empty")]
    EmptySource,

    /// Encoding or writing the output failed
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Output size and filter for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub width: u32,
    pub height: u32,
    pub filter: FilterType,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

impl ExportOptions {
    /// High-quality (Lanczos3) export at `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: FilterType::Lanczos3,
        }
    }
}

/// What an export call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// Nothing to export: no image or no container.
    Skipped,
}

/// `"{index:06}-{tab_index:03}.png"`, unique per folder position and tab.
pub fn output_file_name(index: usize, tab_index: usize) -> String {
    format!("{index:06}-{tab_index:03}.png")
}

/// The part of the source image the crop rectangle currently covers, in
/// source pixels. `None` when the viewport has no image or container.
pub fn source_region(viewport: &Viewport) -> Option<Rect> {
    let crop = viewport.crop_rect()?;
    let scale = viewport.effective_scale();
    if scale <= 0.0 {
        return None;
    }
    let inverse = 1.0 / scale;
    let image = viewport.rendered_image_bounds();

    Some(Rect::new(
        (crop.x - image.x) * inverse,
        (crop.y - image.y) * inverse,
        crop.width * inverse,
        crop.height * inverse,
    ))
}

/// Resample the crop into a new bitmap without writing it.
pub fn render_crop(
    image: &DecodedImage,
    viewport: &Viewport,
    options: &ExportOptions,
) -> Result<Option<DecodedImage>, ExportError> {
    let Some(region) = source_region(viewport) else {
        return Ok(None);
    };
    resample_region(image, &region, options.width, options.height, options.filter).map(Some)
}

/// Resample the crop and write it to `path` as PNG.
pub fn export_crop(
    image: Option<&DecodedImage>,
    viewport: &Viewport,
    options: &ExportOptions,
    path: &Path,
) -> Result<ExportOutcome, ExportError> {
    let Some(image) = image else {
        return Ok(ExportOutcome::Skipped);
    };
    let Some(output) = render_crop(image, viewport, options)? else {
        return Ok(ExportOutcome::Skipped);
    };

    write_png(&output, path)?;
    log::info!(
        "exported {}x{} crop to {}",
        output.width,
        output.height,
        path.display()
    );
    Ok(ExportOutcome::Written(path.to_path_buf()))
}

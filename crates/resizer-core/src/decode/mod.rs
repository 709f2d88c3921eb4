//! Source image decoding.
//!
//! This module provides functionality for:
//! - Decoding any raster format the `image` crate was built with
//! - Correcting EXIF orientation so intrinsic sizes match what users see
//! - Falling back to a bundled asset directory when a path cannot be read
//!
//! Decoding is blocking. A failure is terminal for that one load only; callers
//! treat it as "no image".

mod file;
mod types;

pub use file::{decode_bytes, decode_file, get_orientation, load_image, supported_extensions};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};

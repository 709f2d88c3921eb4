//! PNG encoding for exported crops.
//!
//! Exports are always written as PNG so the alpha channel of the source
//! survives the crop.

use std::io::Cursor;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

use crate::decode::DecodedImage;

/// Errors that can occur during PNG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    /// Writing the encoded file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Encode an RGBA image to PNG bytes.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for a zero-sized image and
/// `EncodeError::InvalidPixelData` when the buffer length does not match.
pub fn encode_png(image: &DecodedImage) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = width as usize * height as usize * DecodedImage::CHANNELS;
    if image.pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: image.pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(&image.pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode `image` as PNG and write it to `path`, replacing any existing file.
pub fn write_png(image: &DecodedImage, path: &Path) -> Result<(), EncodeError> {
    let bytes = encode_png(image)?;
    std::fs::write(path, bytes).map_err(|source| EncodeError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn solid(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(
            width,
            height,
            vec![200u8; width as usize * height as usize * 4],
        )
    }

    #[test]
    fn test_encode_png_basic() {
        let bytes = encode_png(&solid(16, 8)).unwrap();
        assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let img = solid(5, 3);
        let bytes = encode_png(&img).unwrap();
        let decoded = crate::decode::decode_bytes(&bytes).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_encode_png_invalid_pixel_data() {
        let img = DecodedImage {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            encode_png(&img),
            Err(EncodeError::InvalidPixelData {
                expected: 64,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_encode_png_zero_dimensions() {
        let img = DecodedImage {
            width: 0,
            height: 4,
            pixels: vec![],
        };
        assert!(matches!(
            encode_png(&img),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_png(&solid(2, 2), &path).unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_write_png_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");
        assert!(matches!(
            write_png(&solid(2, 2), &path),
            Err(EncodeError::Write { .. })
        ));
    }
}

//! Decoding source images from disk, with EXIF orientation and asset fallback.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode an encoded image from bytes, applying EXIF orientation correction.
///
/// The container format is sniffed from the bytes, so any format the `image`
/// crate was built with is accepted.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognised and
/// `DecodeError::CorruptedFile` if decoding fails part way.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes)
}

/// Load the bitmap for a tab, treating any failure as "no image".
///
/// When `path` cannot be decoded and an `asset_root` is given, the same path
/// is looked up relative to that root (leading separators stripped) before
/// giving up.
pub fn load_image(path: &Path, asset_root: Option<&Path>) -> Option<DecodedImage> {
    let err = match decode_file(path) {
        Ok(image) => return Some(image),
        Err(err) => err,
    };

    let Some(asset) = asset_root.map(|root| asset_path(root, path)) else {
        log::warn!("could not decode {}: {err}", path.display());
        return None;
    };

    match decode_file(&asset) {
        Ok(image) => {
            log::debug!("{} loaded from bundled assets", path.display());
            Some(image)
        }
        Err(asset_err) => {
            log::warn!(
                "could not decode {} ({err}) or bundled asset {} ({asset_err})",
                path.display(),
                asset.display()
            );
            None
        }
    }
}

/// Lowercase file extensions (without the dot) the decoder understands.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = ImageFormat::all()
        .filter(|format| format.reading_enabled())
        .flat_map(|format| format.extensions_str().iter().copied())
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    extensions
}

/// Extract EXIF orientation value from encoded bytes.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn asset_path(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect();
    root.join(relative)
}

/// Returns `Orientation::Normal` if no EXIF data is found.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

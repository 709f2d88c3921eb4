//! Source folder enumeration.
//!
//! Only the folder's direct entries are considered. Entries are returned in
//! lexicographic file-name order so that output numbering is reproducible.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::decode::supported_extensions;

/// List the decodable images directly inside `folder`.
///
/// Returns `None` when the path is empty or not a directory; the caller
/// treats that as "nothing to do".
pub fn scan_folder(folder: &Path) -> Option<Vec<PathBuf>> {
    scan_folder_with(folder, &supported_extensions())
}

/// Like [`scan_folder`] with an explicit set of lowercase extensions.
pub fn scan_folder_with(folder: &Path, extensions: &[&str]) -> Option<Vec<PathBuf>> {
    if folder.as_os_str().is_empty() || !folder.is_dir() {
        log::debug!("skipping scan of {}: not a directory", folder.display());
        return None;
    }

    let files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                log::debug!("skipping unreadable entry: {error}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect();

    log::info!("found {} images in {}", files.len(), folder.display());
    Some(files)
}

/// Whether `path` ends in one of `extensions`, ignoring case.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

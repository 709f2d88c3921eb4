//! Folder session and navigation.
//!
//! A [`Session`] owns the scanned file list, the current position in it, a
//! per-item [`ItemStatus`] and the [`TabSet`] for the current image. Stepping
//! forward or back exports every tab, then loads the new file into the primary
//! tab (which prunes the secondary ones).
//!
//! Navigation calls that the presentation layer would have disabled
//! (`prev` on the first item, `next`/`skip` on the last) do nothing and
//! return `false`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::config::Config;
use crate::export::{ExportError, ExportOptions, ExportOutcome};
use crate::geometry::Size;
use crate::scan::scan_folder;
use crate::tab::TabSet;

/// Suffix appended to the source folder when no destination is set.
pub const DEFAULT_DESTINATION_SUFFIX: &str = "_cropped";

/// Errors from session operations that write output.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No destination folder and no source folder to derive one from")]
    NoDestination,

    #[error("Failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Progress marker for one file in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Skipped,
    Done,
}

/// Items per second between navigation steps.
#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    since: Instant,
    rate: f64,
}

impl Default for Throughput {
    fn default() -> Self {
        Self {
            since: Instant::now(),
            rate: 0.0,
        }
    }
}

impl Throughput {
    /// Record one completed step and return the new rate.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.since).as_secs_f64();
        self.since = now;
        self.rate = if elapsed > 0.0 { 1.0 / elapsed } else { 0.0 };
        self.rate
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Restart the clock and zero the readout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Two-decimal readout, e.g. `"0.25"`.
    pub fn label(&self) -> String {
        format!("{:.2}", self.rate)
    }
}

/// The folder being worked through and the tabs for its current image.
#[derive(Debug)]
pub struct Session {
    source_folder: Option<PathBuf>,
    destination_folder: Option<PathBuf>,
    files: Vec<PathBuf>,
    statuses: Vec<ItemStatus>,
    current: Option<usize>,
    tabs: TabSet,
    export_options: ExportOptions,
    asset_root: Option<PathBuf>,
    throughput: Throughput,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            source_folder: None,
            destination_folder: None,
            files: Vec::new(),
            statuses: Vec::new(),
            current: None,
            tabs: TabSet::new(config.viewport_settings()),
            export_options: config.export_options(),
            asset_root: None,
            throughput: Throughput::default(),
        }
    }

    /// Directory searched for a file of the same relative path when a source
    /// cannot be decoded.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Pick up changed settings. Existing tabs keep their images.
    pub fn apply_config(&mut self, config: &Config) {
        self.tabs.apply_settings(config.viewport_settings());
        self.export_options = config.export_options();
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    pub fn source_folder(&self) -> Option<&Path> {
        self.source_folder.as_deref()
    }

    /// Scan `folder` and start working through it. An empty or invalid path
    /// is ignored and the current list is kept. Returns whether a scan was
    /// applied.
    pub fn open_source_folder(&mut self, folder: &Path) -> bool {
        let Some(files) = scan_folder(folder) else {
            log::debug!("ignoring source folder {:?}", folder);
            return false;
        };
        self.apply_scan(folder, files);
        true
    }

    /// Install a finished scan, replacing any previous list, and open the
    /// first file.
    pub fn apply_scan(&mut self, folder: &Path, files: Vec<PathBuf>) {
        log::info!("{} candidate files in {}", files.len(), folder.display());
        self.source_folder = Some(folder.to_path_buf());
        self.statuses = vec![ItemStatus::Pending; files.len()];
        self.files = files;
        self.current = None;
        if self.files.is_empty() {
            self.tabs.clear_primary();
        } else {
            self.open_index(0);
        }
    }

    /// Set or clear the explicit output folder.
    pub fn set_destination_folder(&mut self, folder: Option<PathBuf>) {
        self.destination_folder = folder.filter(|f| !f.as_os_str().is_empty());
    }

    /// The explicit output folder, or the source folder with `_cropped`
    /// appended.
    pub fn destination_folder(&self) -> Option<PathBuf> {
        if let Some(folder) = &self.destination_folder {
            return Some(folder.clone());
        }
        self.source_folder.as_deref().map(default_destination)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn statuses(&self) -> &[ItemStatus] {
        &self.statuses
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current.and_then(|i| self.files.get(i)).map(PathBuf::as_path)
    }

    pub fn tabs(&self) -> &TabSet {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabSet {
        &mut self.tabs
    }

    /// Lay out every tab in a container of `size`.
    pub fn resize_container(&mut self, size: Size) {
        self.tabs.resize_all(size);
    }

    /// Load the file at `index` into the primary tab without marking or
    /// exporting anything.
    pub fn open_index(&mut self, index: usize) -> bool {
        let Some(path) = self.files.get(index) else {
            return false;
        };
        let loaded = self.tabs.open_primary(path, self.asset_root.as_deref());
        self.current = Some(index);
        loaded
    }

    pub fn can_prev(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn can_next(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.files.len())
    }

    /// Export the current item, mark it done and open the next one.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        let Some(index) = self.current.filter(|_| self.can_next()) else {
            return Ok(false);
        };
        self.export_current()?;
        self.mark(index, ItemStatus::Done);
        self.open_index(index + 1);
        self.throughput.tick();
        Ok(true)
    }

    /// Export the current item, mark it done and open the previous one.
    pub fn prev(&mut self) -> Result<bool, SessionError> {
        let Some(index) = self.current.filter(|_| self.can_prev()) else {
            return Ok(false);
        };
        self.export_current()?;
        self.mark(index, ItemStatus::Done);
        self.open_index(index - 1);
        self.throughput.tick();
        Ok(true)
    }

    /// Mark the current item skipped and open the next one without exporting.
    pub fn skip(&mut self) -> bool {
        let Some(index) = self.current.filter(|_| self.can_next()) else {
            return false;
        };
        self.mark(index, ItemStatus::Skipped);
        self.open_index(index + 1);
        self.throughput.tick();
        true
    }

    /// Mark the current item skipped without moving. Unlike [`Session::skip`]
    /// this also works on the last item, ahead of [`Session::finish`].
    pub fn skip_current(&mut self) -> bool {
        let Some(index) = self.current else {
            return false;
        };
        self.mark(index, ItemStatus::Skipped);
        true
    }

    /// Export the current item, then clear the list and blank the tabs.
    ///
    /// The item is marked done only when at least one tab was written.
    pub fn finish(&mut self) -> Result<Vec<ExportOutcome>, SessionError> {
        let mut outcomes = Vec::new();
        if let Some(index) = self.current {
            outcomes = self.export_current()?;
            if outcomes
                .iter()
                .any(|o| matches!(o, ExportOutcome::Written(_)))
            {
                self.mark(index, ItemStatus::Done);
            }
        }
        log::info!("finished {} of {} files", self.completed(), self.files.len());

        self.files.clear();
        self.statuses.clear();
        self.current = None;
        self.tabs.clear_primary();
        self.throughput.reset();
        Ok(outcomes)
    }

    /// Export every tab of the current item into the destination folder,
    /// creating it if needed. Does nothing without a current item.
    pub fn export_current(&self) -> Result<Vec<ExportOutcome>, SessionError> {
        let Some(index) = self.current else {
            return Ok(Vec::new());
        };
        let folder = self.destination_folder().ok_or(SessionError::NoDestination)?;
        std::fs::create_dir_all(&folder).map_err(|source| SessionError::Io {
            path: folder.display().to_string(),
            source,
        })?;
        Ok(self.tabs.export_all(&folder, index, &self.export_options)?)
    }

    fn mark(&mut self, index: usize, status: ItemStatus) {
        if let Some(slot) = self.statuses.get_mut(index) {
            *slot = status;
        }
    }

    fn completed(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s != ItemStatus::Pending)
            .count()
    }

    /// Fraction of items that are done or skipped, `0.0` for an empty list.
    pub fn progress(&self) -> f64 {
        if self.statuses.is_empty() {
            return 0.0;
        }
        self.completed() as f64 / self.statuses.len() as f64
    }

    pub fn throughput(&self) -> &Throughput {
        &self.throughput
    }

    pub fn reset_throughput(&mut self) {
        self.throughput.reset();
    }
}

/// `"{source}_cropped"`, ignoring trailing separators on `source`.
pub fn default_destination(source: &Path) -> PathBuf {
    let mut name: OsString = source.components().as_path().as_os_str().to_os_string();
    name.push(DEFAULT_DESTINATION_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]))
            .save(path)
            .unwrap();
    }

    /// A source folder with `count` small PNGs and a laid-out session on it.
    fn session_with(count: usize) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("photos");
        std::fs::create_dir(&src).unwrap();
        for i in 0..count {
            write_png(&src.join(format!("img{i}.png")), 40, 30);
        }

        let mut config = Config::default();
        config.cropper_width = 16;
        config.cropper_height = 16;
        let mut session = Session::new(&config);
        session.resize_container(Size::new(80.0, 60.0));
        assert!(session.open_source_folder(&src));
        (dir, session)
    }

    #[test]
    fn test_default_destination() {
        assert_eq!(
            default_destination(Path::new("/data/photos/")),
            PathBuf::from("/data/photos_cropped")
        );
        assert_eq!(
            default_destination(Path::new("photos")),
            PathBuf::from("photos_cropped")
        );
    }

    #[test]
    fn test_open_source_folder_loads_first() {
        let (_dir, session) = session_with(3);
        assert_eq!(session.files().len(), 3);
        assert_eq!(session.current_index(), Some(0));
        assert!(session.tabs().primary().has_image());
        assert_eq!(session.statuses(), &[ItemStatus::Pending; 3]);
        assert!(!session.can_prev());
        assert!(session.can_next());
    }

    #[test]
    fn test_invalid_source_folder_ignored() {
        let (dir, mut session) = session_with(2);
        assert!(!session.open_source_folder(&dir.path().join("nope")));
        assert!(!session.open_source_folder(Path::new("")));
        assert_eq!(session.files().len(), 2);
    }

    #[test]
    fn test_next_exports_and_advances() {
        let (dir, mut session) = session_with(2);
        session.tabs_mut().add_tab();

        assert!(session.next().unwrap());

        let out = dir.path().join("photos_cropped");
        assert!(out.join("000000-000.png").exists());
        assert!(out.join("000000-001.png").exists());
        assert_eq!(session.current_index(), Some(1));
        assert_eq!(session.statuses()[0], ItemStatus::Done);
        assert_eq!(session.tabs().len(), 1);
        assert!((session.progress() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_next_on_last_is_refused() {
        let (_dir, mut session) = session_with(1);
        assert!(!session.next().unwrap());
        assert_eq!(session.statuses()[0], ItemStatus::Pending);
    }

    #[test]
    fn test_skip_does_not_export() {
        let (dir, mut session) = session_with(2);

        assert!(session.skip());

        assert!(!dir.path().join("photos_cropped").exists());
        assert_eq!(session.statuses()[0], ItemStatus::Skipped);
        assert_eq!(session.current_index(), Some(1));
    }

    #[test]
    fn test_prev_exports_and_goes_back() {
        let (dir, mut session) = session_with(3);
        session.skip();
        assert!(session.can_prev());

        assert!(session.prev().unwrap());

        assert!(dir.path().join("photos_cropped/000001-000.png").exists());
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.statuses()[1], ItemStatus::Done);
    }

    #[test]
    fn test_explicit_destination() {
        let (dir, mut session) = session_with(2);
        let dst = dir.path().join("out/nested");
        session.set_destination_folder(Some(dst.clone()));

        session.next().unwrap();

        assert!(dst.join("000000-000.png").exists());
    }

    #[test]
    fn test_finish_clears() {
        let (dir, mut session) = session_with(2);
        session.next().unwrap();

        let outcomes = session.finish().unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(dir.path().join("photos_cropped/000001-000.png").exists());
        assert!(session.files().is_empty());
        assert_eq!(session.current_index(), None);
        assert!(!session.tabs().primary().has_image());
        assert_eq!(session.progress(), 0.0);
    }

    /// A destination that cannot be created because a file sits in its path.
    fn blocked_destination(session: &mut Session, dir: &Path) {
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        session.set_destination_folder(Some(blocker.join("out")));
    }

    #[test]
    fn test_failed_export_leaves_item_pending() {
        let (dir, mut session) = session_with(2);
        blocked_destination(&mut session, dir.path());

        assert!(matches!(session.next(), Err(SessionError::Io { .. })));
        session.skip();
        assert!(matches!(session.prev(), Err(SessionError::Io { .. })));

        assert_eq!(session.current_index(), Some(1));
        assert_eq!(
            session.statuses(),
            &[ItemStatus::Skipped, ItemStatus::Pending]
        );
    }

    #[test]
    fn test_failed_finish_keeps_list() {
        let (dir, mut session) = session_with(1);
        blocked_destination(&mut session, dir.path());

        assert!(session.finish().is_err());

        assert_eq!(session.files().len(), 1);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.statuses(), &[ItemStatus::Pending]);
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn test_skip_current_on_last_item() {
        let (_dir, mut session) = session_with(1);
        session.tabs_mut().clear_primary();
        assert!(!session.skip());

        assert!(session.skip_current());
        assert_eq!(session.statuses(), &[ItemStatus::Skipped]);
        assert_eq!(session.progress(), 1.0);

        let outcomes = session.finish().unwrap();
        assert!(outcomes.iter().all(|o| *o == ExportOutcome::Skipped));
        assert!(!session.skip_current());
    }

    #[test]
    fn test_open_index_does_not_mark() {
        let (_dir, mut session) = session_with(3);
        assert!(session.open_index(2));
        assert!(!session.open_index(3));
        assert_eq!(session.current_index(), Some(2));
        assert_eq!(session.progress(), 0.0);
    }

    #[test]
    fn test_export_without_destination() {
        let mut session = Session::new(&Config::default());
        session.files = vec![PathBuf::from("a.png")];
        session.statuses = vec![ItemStatus::Pending];
        session.current = Some(0);

        assert!(matches!(
            session.export_current(),
            Err(SessionError::NoDestination)
        ));
    }

    #[test]
    fn test_throughput_reset() {
        let mut throughput = Throughput::default();
        throughput.tick();
        assert!(throughput.rate() >= 0.0);
        throughput.reset();
        assert_eq!(throughput.rate(), 0.0);
        assert_eq!(throughput.label(), "0.00");
    }

    #[test]
    fn test_apply_config_changes_output_size() {
        let (dir, mut session) = session_with(2);
        let mut config = Config::default();
        config.cropper_width = 10;
        config.cropper_height = 10;
        session.apply_config(&config);

        session.next().unwrap();

        let written =
            crate::decode::decode_file(&dir.path().join("photos_cropped/000000-000.png")).unwrap();
        assert_eq!((written.width, written.height), (10, 10));
    }
}

//! Crop tabs.
//!
//! A [`CropTab`] is one crop configuration for the currently loaded image: an
//! optional bitmap, its [`Viewport`] and the in-progress pointer drag. Tabs
//! live in a [`TabSet`], whose first entry is the primary tab.
//!
//! # Tab set rules
//!
//! - The set always holds at least the primary tab.
//! - The primary tab cannot be deleted.
//! - New tabs are duplicates of the primary tab.
//! - Opening a new image into the primary tab prunes every other tab.
//! - Headings are ordinals (`"1."`, `"2."`, ...) re-assigned after every add
//!   or delete.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::decode::{load_image, DecodedImage};
use crate::export::{export_crop, output_file_name, ExportError, ExportOptions, ExportOutcome};
use crate::geometry::{Point, Size};
use crate::viewport::{Viewport, ViewportSettings, ViewportSnapshot};

/// Which pointer button started a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Moves the crop rectangle.
    Primary,
    /// Pans the image.
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    button: PointerButton,
    last: Point,
}

/// One crop rectangle over one loaded image.
#[derive(Debug, Clone)]
pub struct CropTab {
    heading: String,
    source_path: Option<PathBuf>,
    image: Option<Arc<DecodedImage>>,
    viewport: Viewport,
    drag: Option<Drag>,
}

impl CropTab {
    /// A blank tab.
    pub fn new(heading: impl Into<String>, settings: ViewportSettings) -> Self {
        Self {
            heading: heading.into(),
            source_path: None,
            image: None,
            viewport: Viewport::new(settings),
            drag: None,
        }
    }

    /// A new tab showing the same image with the same zoom and pan.
    ///
    /// The crop rectangle is not copied; it is derived afresh and centered.
    pub fn duplicate(&self, heading: impl Into<String>) -> Self {
        let mut tab = Self::new(heading, self.viewport.settings());
        tab.source_path = self.source_path.clone();
        tab.image = self.image.clone();
        if let Some(container) = self.viewport.container() {
            tab.viewport.resize_container(container);
        }
        tab.viewport.set_image_size(self.viewport.image_size());
        tab.viewport.copy_zoom_and_pan(&self.viewport);
        tab
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn set_heading(&mut self, heading: impl Into<String>) {
        self.heading = heading.into();
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Decode `path` and show it. A file that cannot be decoded leaves the tab
    /// blank. Returns whether an image was loaded.
    pub fn open(&mut self, path: &Path, asset_root: Option<&Path>) -> bool {
        let image = load_image(path, asset_root);
        let loaded = image.is_some();
        self.set_image(Some(path.to_path_buf()), image);
        loaded
    }

    /// Replace the bitmap wholesale. Pan resets and the crop is re-centered.
    pub fn set_image(
        &mut self,
        path: Option<PathBuf>,
        image: Option<DecodedImage>,
    ) -> ViewportSnapshot {
        self.drag = None;
        self.source_path = path;
        self.image = image.filter(|img| !img.is_empty()).map(Arc::new);
        let size = self.image.as_deref().map(DecodedImage::size);
        self.viewport.set_image_size(size)
    }

    /// Drop the image and path.
    pub fn clear(&mut self) -> ViewportSnapshot {
        self.set_image(None, None)
    }

    pub fn resize_container(&mut self, size: Size) -> ViewportSnapshot {
        self.viewport.resize_container(size)
    }

    pub fn apply_settings(&mut self, settings: ViewportSettings) -> ViewportSnapshot {
        self.viewport.set_settings(settings)
    }

    /// Start a drag at `position` (container coordinates).
    pub fn pointer_pressed(&mut self, button: PointerButton, position: Point) {
        self.drag = Some(Drag {
            button,
            last: position,
        });
    }

    /// Continue the drag. Returns `None` when no drag is in progress.
    pub fn pointer_moved(&mut self, position: Point) -> Option<ViewportSnapshot> {
        let drag = self.drag.as_mut()?;
        let dx = position.x - drag.last.x;
        let dy = position.y - drag.last.y;
        drag.last = position;
        let button = drag.button;

        let snapshot = match button {
            PointerButton::Secondary => self.viewport.pan(dx, dy),
            PointerButton::Primary => self.viewport.move_crop_rect(dx, dy),
        };
        Some(snapshot)
    }

    /// End the drag started with `button`. Other buttons are ignored.
    pub fn pointer_released(&mut self, button: PointerButton) {
        if self.drag.is_some_and(|d| d.button == button) {
            self.drag = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn wheel(&mut self, delta_x: f64, delta_y: f64) -> ViewportSnapshot {
        self.viewport.zoom_by_wheel(delta_x, delta_y)
    }

    /// Source image width readout, e.g. `"4000px"`.
    pub fn width_label(&self) -> Option<String> {
        self.image().map(DecodedImage::width_label)
    }

    /// Source image height readout, e.g. `"3000px"`.
    pub fn height_label(&self) -> Option<String> {
        self.image().map(DecodedImage::height_label)
    }

    /// Size of the cropped source area, e.g. `("3000.00px", "3000.00px")`.
    pub fn crop_source_labels(&self) -> Option<(String, String)> {
        let size = self.viewport.crop_source_size()?;
        Some((
            format!("{:.2}px", size.width),
            format!("{:.2}px", size.height),
        ))
    }

    /// Write this tab's crop to `path`. Skipped when blank or not laid out.
    pub fn export(&self, options: &ExportOptions, path: &Path) -> Result<ExportOutcome, ExportError> {
        export_crop(self.image(), &self.viewport, options, path)
    }
}

/// The ordered tabs for the current image.
#[derive(Debug, Clone)]
pub struct TabSet {
    tabs: Vec<CropTab>,
}

impl TabSet {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            tabs: vec![CropTab::new(Self::heading_for(0), settings)],
        }
    }

    fn heading_for(index: usize) -> String {
        format!("{}.", index + 1)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Always false: the primary tab cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> &[CropTab] {
        &self.tabs
    }

    pub fn get(&self, index: usize) -> Option<&CropTab> {
        self.tabs.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CropTab> {
        self.tabs.get_mut(index)
    }

    pub fn primary(&self) -> &CropTab {
        &self.tabs[0]
    }

    pub fn primary_mut(&mut self) -> &mut CropTab {
        &mut self.tabs[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropTab> {
        self.tabs.iter()
    }

    /// Append a duplicate of the primary tab and return its index.
    pub fn add_tab(&mut self) -> usize {
        let index = self.tabs.len();
        let tab = self.primary().duplicate(Self::heading_for(index));
        self.tabs.push(tab);
        self.relabel();
        log::debug!("added tab {index}");
        index
    }

    /// Remove the tab at `index`. The primary tab and out-of-range indices are
    /// refused. Returns whether a tab was removed.
    pub fn delete_tab(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.tabs.len() {
            return false;
        }
        self.tabs.remove(index);
        self.relabel();
        true
    }

    /// Drop every tab except the primary one.
    pub fn prune(&mut self) {
        self.tabs.truncate(1);
        self.relabel();
    }

    fn relabel(&mut self) {
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.set_heading(Self::heading_for(i));
        }
    }

    /// Load `path` into the primary tab after pruning the others.
    pub fn open_primary(&mut self, path: &Path, asset_root: Option<&Path>) -> bool {
        self.prune();
        self.primary_mut().open(path, asset_root)
    }

    /// Prune and blank the primary tab.
    pub fn clear_primary(&mut self) {
        self.prune();
        self.primary_mut().clear();
    }

    pub fn apply_settings(&mut self, settings: ViewportSettings) {
        for tab in &mut self.tabs {
            tab.apply_settings(settings);
        }
    }

    /// Lay every tab out in a container of `size`.
    pub fn resize_all(&mut self, size: Size) {
        for tab in &mut self.tabs {
            tab.resize_container(size);
        }
    }

    /// Export every tab into `dir` as `"{index:06}-{tab:03}.png"`.
    pub fn export_all(
        &self,
        dir: &Path,
        index: usize,
        options: &ExportOptions,
    ) -> Result<Vec<ExportOutcome>, ExportError> {
        self.tabs
            .iter()
            .enumerate()
            .map(|(tab_index, tab)| tab.export(options, &dir.join(output_file_name(index, tab_index))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        });
        DecodedImage::from_rgba_image(img)
    }

    fn loaded_tab() -> CropTab {
        let mut tab = CropTab::new("1.", ViewportSettings::default());
        tab.resize_container(Size::new(80.0, 60.0));
        tab.set_image(Some(PathBuf::from("a.png")), Some(gradient(400, 300)));
        tab
    }

    #[test]
    fn test_new_tab_is_blank() {
        let tab = CropTab::new("1.", ViewportSettings::default());
        assert_eq!(tab.heading(), "1.");
        assert!(!tab.has_image());
        assert!(tab.source_path().is_none());
        assert!(tab.viewport().crop_rect().is_none());
        assert!(tab.width_label().is_none());
    }

    #[test]
    fn test_set_image_lays_out_crop() {
        let tab = loaded_tab();
        let crop = tab.viewport().crop_rect().unwrap();
        assert!((crop.width - 60.0).abs() < 1e-9);
        assert!((crop.x - 10.0).abs() < 1e-9);
        assert_eq!(tab.width_label().unwrap(), "400px");
        assert_eq!(tab.height_label().unwrap(), "300px");
    }

    #[test]
    fn test_crop_source_labels() {
        let tab = loaded_tab();
        let (w, h) = tab.crop_source_labels().unwrap();
        assert_eq!(w, "300.00px");
        assert_eq!(h, "300.00px");
    }

    #[test]
    fn test_empty_bitmap_counts_as_blank() {
        let mut tab = loaded_tab();
        tab.set_image(None, Some(DecodedImage::new(0, 0, vec![])));
        assert!(!tab.has_image());
        assert!(tab.viewport().crop_rect().is_none());
    }

    #[test]
    fn test_open_missing_file_leaves_blank() {
        let dir = tempfile::tempdir().unwrap();
        let mut tab = loaded_tab();

        let loaded = tab.open(&dir.path().join("missing.png"), None);

        assert!(!loaded);
        assert!(!tab.has_image());
    }

    #[test]
    fn test_secondary_drag_pans() {
        let mut tab = loaded_tab();
        tab.viewport_mut().set_relative_zoom_percent(200.0);
        let before = tab.viewport().pan_offset();

        tab.pointer_pressed(PointerButton::Secondary, Point::new(40.0, 30.0));
        let snapshot = tab.pointer_moved(Point::new(50.0, 30.0)).unwrap();

        assert!((snapshot.pan_offset.x - (before.x + 10.0)).abs() < 1e-9);
        assert!(tab.is_dragging());
        tab.pointer_released(PointerButton::Secondary);
        assert!(!tab.is_dragging());
        assert!(tab.pointer_moved(Point::new(60.0, 30.0)).is_none());
    }

    #[test]
    fn test_primary_drag_moves_crop() {
        let mut tab = loaded_tab();
        tab.viewport_mut().set_relative_zoom_percent(200.0);
        let before = tab.viewport().crop_rect().unwrap();

        tab.pointer_pressed(PointerButton::Primary, Point::new(40.0, 30.0));
        tab.pointer_moved(Point::new(35.0, 32.0));
        tab.pointer_moved(Point::new(30.0, 34.0));

        let after = tab.viewport().crop_rect().unwrap();
        assert!((after.x - (before.x - 10.0)).abs() < 1e-9);
        assert!((after.y - (before.y + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_release_other_button_keeps_drag() {
        let mut tab = loaded_tab();
        tab.pointer_pressed(PointerButton::Primary, Point::ORIGIN);
        tab.pointer_released(PointerButton::Secondary);
        assert!(tab.is_dragging());
    }

    #[test]
    fn test_duplicate_copies_image_zoom_pan() {
        let mut tab = loaded_tab();
        tab.viewport_mut().set_relative_zoom_percent(300.0);
        tab.viewport_mut().pan(20.0, -10.0);
        tab.viewport_mut().move_crop_rect(-5.0, 0.0);

        let copy = tab.duplicate("2.");

        assert_eq!(copy.heading(), "2.");
        assert_eq!(copy.source_path(), tab.source_path());
        assert_eq!(copy.image(), tab.image());
        assert_eq!(copy.viewport().zoom_factor(), tab.viewport().zoom_factor());
        assert_eq!(copy.viewport().pan_offset(), tab.viewport().pan_offset());
        let crop = copy.viewport().crop_rect().unwrap();
        assert!((crop.x - 10.0).abs() < 1e-9);
        assert!((crop.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_tab_set_starts_with_primary() {
        let set = TabSet::new(ViewportSettings::default());
        assert_eq!(set.len(), 1);
        assert_eq!(set.primary().heading(), "1.");
    }

    #[test]
    fn test_delete_only_secondary_relabels() {
        let mut set = TabSet::new(ViewportSettings::default());
        set.add_tab();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().heading(), "2.");

        assert!(set.delete_tab(1));

        assert_eq!(set.len(), 1);
        assert_eq!(set.primary().heading(), "1.");
    }

    #[test]
    fn test_primary_not_deletable() {
        let mut set = TabSet::new(ViewportSettings::default());
        set.add_tab();
        assert!(!set.delete_tab(0));
        assert!(!set.delete_tab(5));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_delete_middle_relabels() {
        let mut set = TabSet::new(ViewportSettings::default());
        set.add_tab();
        set.add_tab();
        set.add_tab();

        set.delete_tab(1);

        let headings: Vec<_> = set.iter().map(CropTab::heading).collect();
        assert_eq!(headings, vec!["1.", "2.", "3."]);
    }

    #[test]
    fn test_open_primary_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        gradient(8, 8).as_rgba_image().unwrap().save(&path).unwrap();

        let mut set = TabSet::new(ViewportSettings::default());
        set.add_tab();
        set.add_tab();

        assert!(set.open_primary(&path, None));
        assert_eq!(set.len(), 1);
        assert!(set.primary().has_image());
    }

    #[test]
    fn test_export_all_names_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = TabSet::new(ViewportSettings::default());
        set.resize_all(Size::new(80.0, 60.0));
        set.primary_mut()
            .set_image(Some(PathBuf::from("a.png")), Some(gradient(40, 30)));
        set.add_tab();

        let outcomes = set
            .export_all(dir.path(), 7, &ExportOptions::new(8, 8))
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(dir.path().join("000007-000.png").exists());
        assert!(dir.path().join("000007-001.png").exists());
    }

    #[test]
    fn test_export_all_skips_blank() {
        let dir = tempfile::tempdir().unwrap();
        let set = TabSet::new(ViewportSettings::default());
        let outcomes = set
            .export_all(dir.path(), 0, &ExportOptions::default())
            .unwrap();
        assert_eq!(outcomes, vec![ExportOutcome::Skipped]);
    }
}

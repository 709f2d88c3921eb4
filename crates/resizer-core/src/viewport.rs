//! Crop viewport geometry.
//!
//! A [`Viewport`] tracks three coordinate spaces for one crop tab:
//!
//! - **Image space**: intrinsic pixels of the loaded bitmap.
//! - **Display space**: pixels of the container the image is rendered into.
//!   The rendered image is centered in the container, scaled by
//!   [`Viewport::effective_scale`] and shifted by the pan offset.
//! - **Crop space**: a fixed-size rectangle in display space whose top-left
//!   corner is measured from the container's top-left corner.
//!
//! # Invariants
//!
//! Once both an image and a container are known:
//!
//! - The zoom factor is never below 1, so the image is never rendered smaller
//!   than its fit-to-container size.
//! - On an axis where the rendered image is larger than the container, the
//!   image always covers the whole container (no gap is exposed).
//! - The crop rectangle always lies inside the rendered image bounds.
//! - The crop rectangle's size depends only on the image size, the container
//!   size and the crop aspect ratio. Zoom and pan only move it.
//!
//! # Drag deltas
//!
//! [`Viewport::pan`] and [`Viewport::move_crop_rect`] take the pointer motion
//! since the previous event (`current - previous`). With an inversion flag set
//! the content follows the pointer on that axis; with it cleared the content
//! moves against the pointer.

use crate::geometry::{Axis, Point, Rect, Size, EDGE_TOLERANCE};

/// Per-tab knobs taken from the process configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSettings {
    /// Crop width divided by crop height.
    pub crop_aspect: f64,
    /// Content follows the pointer horizontally.
    pub invert_x: bool,
    /// Content follows the pointer vertically.
    pub invert_y: bool,
    /// Zoom percent added per wheel notch.
    pub zoom_step: f64,
    /// Zoom factor applied when an image is loaded (1.0 = fit).
    pub initial_zoom: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            crop_aspect: 1.0,
            invert_x: true,
            invert_y: true,
            zoom_step: 2.0,
            initial_zoom: 1.0,
        }
    }
}

impl ViewportSettings {
    /// Replace non-finite or non-positive values with the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64, fallback: f64| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                fallback
            }
        };
        Self {
            crop_aspect: positive(self.crop_aspect, defaults.crop_aspect),
            zoom_step: if self.zoom_step.is_finite() {
                self.zoom_step
            } else {
                defaults.zoom_step
            },
            initial_zoom: positive(self.initial_zoom, defaults.initial_zoom).max(1.0),
            ..self
        }
    }
}

/// Derived viewport values after a mutation, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub default_render_scale: f64,
    pub effective_scale: f64,
    pub zoom_percent: f64,
    pub pan_offset: Point,
    pub rendered_bounds: Rect,
    /// `None` until both an image and a container are known.
    pub crop_rect: Option<Rect>,
}

/// Pan, zoom and crop placement for one image inside one container.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    settings: ViewportSettings,
    image_size: Option<Size>,
    container: Option<Size>,
    zoom_factor: f64,
    pan_offset: Point,
    crop_rect: Rect,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportSettings::default())
    }
}

impl Viewport {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            settings: settings.sanitized(),
            image_size: None,
            container: None,
            zoom_factor: 1.0,
            pan_offset: Point::ORIGIN,
            crop_rect: Rect::default(),
        }
    }

    pub fn settings(&self) -> ViewportSettings {
        self.settings
    }

    /// Swap in new settings. A changed crop aspect re-derives the crop size.
    pub fn set_settings(&mut self, settings: ViewportSettings) -> ViewportSnapshot {
        let settings = settings.sanitized();
        let aspect_changed = (settings.crop_aspect - self.settings.crop_aspect).abs() > f64::EPSILON;
        self.settings = settings;
        if aspect_changed {
            self.recompute_crop_rect();
            self.reclamp();
        }
        self.snapshot()
    }

    pub fn image_size(&self) -> Option<Size> {
        self.image_size
    }

    pub fn container(&self) -> Option<Size> {
        self.container
    }

    /// True once both an image and a non-empty container are known.
    pub fn is_ready(&self) -> bool {
        self.image_size.is_some() && self.container.is_some()
    }

    /// Install the intrinsic size of a newly loaded image, or clear it.
    ///
    /// Pan is reset, zoom goes back to the configured initial zoom and the
    /// crop rectangle is re-derived and centered.
    pub fn set_image_size(&mut self, size: Option<Size>) -> ViewportSnapshot {
        self.image_size = size.filter(|s| !s.is_empty());
        self.zoom_factor = self.settings.initial_zoom;
        self.pan_offset = Point::ORIGIN;
        self.recompute_crop_rect();
        self.reclamp();
        self.snapshot()
    }

    /// The container was laid out again with a new size.
    pub fn resize_container(&mut self, size: Size) -> ViewportSnapshot {
        self.container = Some(size).filter(|s| !s.is_empty());
        self.recompute_crop_rect();
        self.reclamp();
        self.snapshot()
    }

    /// Render scale at which the image exactly fits the container.
    ///
    /// When the image is relatively wider than the container its width is the
    /// constraint, otherwise its height is. Returns `0.0` when not ready.
    pub fn default_render_scale(&self) -> f64 {
        let (Some(image), Some(container)) = (self.image_size, self.container) else {
            return 0.0;
        };
        if image.aspect_ratio() > container.aspect_ratio() {
            container.width / image.width
        } else {
            container.height / image.height
        }
    }

    /// User zoom on top of the fit scale, always at least 1.
    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Display pixels per source pixel.
    pub fn effective_scale(&self) -> f64 {
        self.default_render_scale() * self.zoom_factor
    }

    /// Effective scale expressed as a percentage of intrinsic size.
    pub fn zoom_percent(&self) -> f64 {
        self.effective_scale() * 100.0
    }

    pub fn pan_offset(&self) -> Point {
        self.pan_offset
    }

    /// Set the zoom as a percentage of intrinsic size.
    ///
    /// Requests below the fit-equivalent percentage clamp the zoom factor to 1.
    /// Pan and crop position are re-clamped under the new scale without any
    /// additional movement.
    pub fn set_zoom_percent(&mut self, percent: f64) -> ViewportSnapshot {
        let default_scale = self.default_render_scale();
        if default_scale <= 0.0 || !percent.is_finite() {
            return self.snapshot();
        }
        self.zoom_factor = (percent / 100.0 / default_scale).max(1.0);
        self.pan(0.0, 0.0);
        self.move_crop_rect(0.0, 0.0)
    }

    /// Zoom as a percentage of the fit scale (100 = fit).
    pub fn relative_zoom_percent(&self) -> f64 {
        self.zoom_factor * 100.0
    }

    /// Set the zoom relative to the fit scale. Values below 100 clamp to fit.
    pub fn set_relative_zoom_percent(&mut self, percent: f64) -> ViewportSnapshot {
        self.set_zoom_percent(percent * self.default_render_scale())
    }

    /// Apply one wheel event. The horizontal delta is used when the vertical
    /// one is zero.
    pub fn zoom_by_wheel(&mut self, delta_x: f64, delta_y: f64) -> ViewportSnapshot {
        let delta = if delta_y == 0.0 { delta_x } else { delta_y };
        let target = self.zoom_percent() + delta * self.settings.zoom_step;
        self.set_zoom_percent(target)
    }

    /// Where the image currently sits inside the container.
    pub fn rendered_image_bounds(&self) -> Rect {
        let (Some(image), Some(container)) = (self.image_size, self.container) else {
            return Rect::default();
        };
        let rendered = image.scale(self.effective_scale());
        Rect::new(
            (container.width - rendered.width) / 2.0 + self.pan_offset.x,
            (container.height - rendered.height) / 2.0 + self.pan_offset.y,
            rendered.width,
            rendered.height,
        )
    }

    /// The crop rectangle in display space, once an image and container are known.
    pub fn crop_rect(&self) -> Option<Rect> {
        self.is_ready().then_some(self.crop_rect)
    }

    /// Size of the area the crop rectangle covers, in source pixels.
    pub fn crop_source_size(&self) -> Option<Size> {
        let scale = self.effective_scale();
        if scale <= 0.0 {
            return None;
        }
        self.crop_rect().map(|r| r.size().scale(1.0 / scale))
    }

    /// Drag the image by a pointer delta.
    ///
    /// Each axis is clamped against the container independently. Afterwards
    /// the crop rectangle follows the image on any axis where it would no
    /// longer be inside the rendered bounds.
    pub fn pan(&mut self, dx: f64, dy: f64) -> ViewportSnapshot {
        let Some(container) = self.container else {
            return self.snapshot();
        };
        if self.image_size.is_none() {
            return self.snapshot();
        }

        let delta = self.apply_inversion(dx, dy);
        let bounds = self.rendered_image_bounds();
        for axis in Axis::BOTH {
            self.clamp_pan_axis(axis, delta.along(axis), &bounds, container);
        }

        let bounds = self.rendered_image_bounds();
        let mut follow = Point::ORIGIN;
        let mut needs_follow = false;
        for axis in Axis::BOTH {
            if !bounds.contains_along(&self.crop_rect, axis) {
                follow.set_along(axis, delta.along(axis));
                needs_follow = true;
            }
        }
        if needs_follow {
            self.shift_crop_rect(follow);
        }
        self.snapshot()
    }

    /// Drag the crop rectangle by a pointer delta. Its size never changes.
    pub fn move_crop_rect(&mut self, dx: f64, dy: f64) -> ViewportSnapshot {
        if !self.is_ready() {
            return self.snapshot();
        }
        let delta = self.apply_inversion(dx, dy);
        self.shift_crop_rect(delta);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            default_render_scale: self.default_render_scale(),
            effective_scale: self.effective_scale(),
            zoom_percent: self.zoom_percent(),
            pan_offset: self.pan_offset,
            rendered_bounds: self.rendered_image_bounds(),
            crop_rect: self.crop_rect(),
        }
    }

    /// Copy of the zoom and pan state of `other`, for tab duplication.
    pub(crate) fn copy_zoom_and_pan(&mut self, other: &Viewport) {
        self.zoom_factor = other.zoom_factor.max(1.0);
        self.pan_offset = other.pan_offset;
        self.reclamp();
    }

    fn apply_inversion(&self, dx: f64, dy: f64) -> Point {
        Point::new(
            if self.settings.invert_x { dx } else { -dx },
            if self.settings.invert_y { dy } else { -dy },
        )
    }

    fn clamp_pan_axis(&mut self, axis: Axis, delta: f64, bounds: &Rect, container: Size) {
        let rendered = bounds.extent(axis);
        let limit = container.along(axis);
        let offset = self.pan_offset.along(axis);

        let next = if rendered > limit + EDGE_TOLERANCE {
            let future = bounds.start(axis) + delta;
            if future <= 0.0 && future + rendered >= limit {
                offset + delta
            } else if future > 0.0 {
                // leading edge would leave the container edge
                offset - bounds.start(axis)
            } else {
                // trailing edge would leave the far container edge
                (limit - rendered) / 2.0
            }
        } else {
            0.0
        };

        if next != offset + delta {
            log::debug!("pan {axis:?} clamped: requested {}, applied {next}", offset + delta);
        }
        self.pan_offset.set_along(axis, next);
    }

    /// Move the crop rectangle by an already-inverted delta and clamp it back
    /// into the rendered image.
    fn shift_crop_rect(&mut self, delta: Point) {
        let bounds = self.rendered_image_bounds();
        let current = self.crop_rect;
        let mut proposed = Rect::new(
            current.x + delta.x,
            current.y + delta.y,
            current.width,
            current.height,
        );

        for axis in Axis::BOTH {
            if !bounds.contains_along(&proposed, axis) {
                proposed = proposed.with_start(axis, current.start(axis));
            }
        }

        for axis in Axis::BOTH {
            if !bounds.contains_along(&proposed, axis) {
                let start = if proposed.start(axis) < bounds.start(axis) {
                    bounds.start(axis)
                } else {
                    bounds.end(axis) - proposed.extent(axis)
                };
                proposed = proposed.with_start(axis, start);
            }
        }

        self.crop_rect = proposed;
    }

    fn recompute_crop_rect(&mut self) {
        let (Some(image), Some(container)) = (self.image_size, self.container) else {
            self.crop_rect = Rect::default();
            return;
        };
        let fit = self.default_render_scale();
        let aspect = self.settings.crop_aspect;

        let size = if image.aspect_ratio() >= aspect {
            let height = image.height * fit;
            Size::new(height * aspect, height)
        } else {
            let width = image.width * fit;
            Size::new(width, width / aspect)
        };

        self.crop_rect = Rect::new(
            (container.width - size.width) / 2.0,
            (container.height - size.height) / 2.0,
            size.width,
            size.height,
        );
    }

    fn reclamp(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.pan(0.0, 0.0);
        self.shift_crop_rect(Point::ORIGIN);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

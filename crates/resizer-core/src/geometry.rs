//! Plain geometry values shared by the viewport and export code.
//!
//! All values are in floating point display or image pixels. The origin is the
//! top-left corner, x grows to the right and y grows downwards.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing edges, so that a rectangle sitting exactly on
/// an edge after a chain of floating point operations still counts as inside.
pub const EDGE_TOLERANCE: f64 = 1e-6;

/// One of the two screen axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Both axes, in the order the clamping code visits them.
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or `0.0` for a degenerate size.
    pub fn aspect_ratio(self) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.width / self.height
    }

    /// True when either dimension is zero, negative or not finite.
    pub fn is_empty(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Multiply both dimensions by `factor`.
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    pub fn along(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }
}

/// A point or a 2D offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn along(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn set_along(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
    }
}

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Leading edge (left or top) along `axis`.
    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Trailing edge (right or bottom) along `axis`.
    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.right(),
            Axis::Y => self.bottom(),
        }
    }

    pub fn extent(&self, axis: Axis) -> f64 {
        self.size().along(axis)
    }

    /// Copy of this rectangle with its leading edge on `axis` moved to `start`.
    pub fn with_start(mut self, axis: Axis, start: f64) -> Self {
        match axis {
            Axis::X => self.x = start,
            Axis::Y => self.y = start,
        }
        self
    }

    /// Whether `inner` lies inside `self` when projected onto `axis`.
    pub fn contains_along(&self, inner: &Rect, axis: Axis) -> bool {
        self.start(axis) <= inner.start(axis) + EDGE_TOLERANCE
            && self.end(axis) + EDGE_TOLERANCE >= inner.end(axis)
    }

    /// Whether `inner` lies fully inside `self` on both axes.
    pub fn contains_rect(&self, inner: &Rect) -> bool {
        Axis::BOTH
            .iter()
            .all(|&axis| self.contains_along(inner, axis))
    }
}

//! Viewport math: fitting the logical canvas into its on-screen container.
//!
//! The logical canvas never changes size when the window does. Only the
//! display scale, the backing-store resolution and the coordinate mapping
//! move, and they are always recomputed from scratch.

use crate::model::ViewTransform;
use kurbo::{Point, Size};

/// Padding subtracted from the container on each measurement.
pub const CONTAINER_PADDING: f64 = 40.0;

/// Floor for the fit scale when the container collapses.
pub const MIN_VIEWPORT_SCALE: f64 = 0.01;

/// Fit scale for a `logical_*` canvas inside a `container_*` box.
///
/// Never upscales; degenerate inputs clamp to [`MIN_VIEWPORT_SCALE`].
pub fn compute_scale(
    container_width: f64,
    container_height: f64,
    logical_width: f64,
    logical_height: f64,
    padding: f64,
) -> f64 {
    if logical_width <= 0.0 || logical_height <= 0.0 {
        return 1.0;
    }
    let available_w = container_width - padding;
    let available_h = container_height - padding;
    let scale = (available_w / logical_width)
        .min(available_h / logical_height)
        .min(1.0);
    if scale.is_finite() {
        scale.max(MIN_VIEWPORT_SCALE)
    } else {
        MIN_VIEWPORT_SCALE
    }
}

/// The on-screen box the canvas is mounted in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
    pub padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            device_pixel_ratio: 1.0,
            padding: CONTAINER_PADDING,
        }
    }
}

/// Everything the renderer needs to present one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportLayout {
    /// Fit-to-container scale.
    pub fit_scale: f64,
    /// Fit scale × user zoom.
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    /// CSS size of the canvas element.
    pub display: Size,
    /// Physical pixel size of the backing store.
    pub backing_width: u32,
    pub backing_height: u32,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    /// Lay out a `logical` canvas with the user's view transform applied.
    pub fn layout(&self, logical: Size, view: &ViewTransform) -> ViewportLayout {
        let fit_scale = compute_scale(
            self.width,
            self.height,
            logical.width,
            logical.height,
            self.padding,
        );
        let display = Size::new(logical.width * fit_scale, logical.height * fit_scale);
        let dpr = if self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        ViewportLayout {
            fit_scale,
            zoom: fit_scale * view.zoom,
            pan_x: view.pan_x,
            pan_y: view.pan_y,
            display,
            backing_width: (display.width * dpr).round() as u32,
            backing_height: (display.height * dpr).round() as u32,
        }
    }
}

impl ViewportLayout {
    /// Map a point on the canvas element (CSS px) to logical canvas space.
    pub fn to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan_x) / self.zoom,
            (screen.y - self.pan_y) / self.zoom,
        )
    }

    /// Map a logical point to CSS px on the canvas element.
    pub fn to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.zoom + self.pan_x,
            logical.y * self.zoom + self.pan_y,
        )
    }
}

//! Pan/zoom view over the diagram.

use crate::surface::DiagramSurface;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom that maps one page pixel to one view pixel.
pub const BASE_ZOOM: f64 = 1.0;

/// Camera manages the view transform of one diagram view.
///
/// `world = (view - offset) / zoom`. Everything the editor stores and
/// hit-tests lives in world units; only pointer input and rendering deal
/// in view pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// View-space origin of the diagram (pan).
    pub offset: Vec2,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: BASE_ZOOM,
            min_zoom: 0.1,
            max_zoom: 8.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom bounds.
    pub fn with_limits(min_zoom: f64, max_zoom: f64) -> Self {
        Self { min_zoom, max_zoom, ..Self::default() }
    }

    /// World → view transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// View → world transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a view position to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world position to view coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan by a delta in view pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping the given view point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let moved = self.world_to_screen(anchor);
        self.offset += screen_point - moved;
    }

    /// Back to no pan at base zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = BASE_ZOOM;
    }

    /// Fit the whole page into the viewport, centered, with `padding` view pixels around it.
    pub fn fit_to_surface(&mut self, surface: DiagramSurface, viewport: Size, padding: f64) {
        if surface.is_empty() {
            self.reset();
            return;
        }
        self.fit_to_rect(surface.bounds(), viewport, padding);
    }

    /// Center `bounds` (world units) in the viewport at the largest zoom
    /// that keeps it inside the padding. Degenerate extents fall back to
    /// the other axis, then to the current zoom.
    pub fn fit_to_rect(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        let avail = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale = |extent: f64, room: f64| (extent > 0.0).then(|| room / extent);
        let zoom = match (scale(bounds.width(), avail.width), scale(bounds.height(), avail.height)) {
            (Some(x), Some(y)) => x.min(y),
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => self.zoom,
        };
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);

        let center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * self.zoom,
            viewport.height / 2.0 - center.y * self.zoom,
        );
    }
}

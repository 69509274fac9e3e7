//! The rasterized diagram page the markings sit on.

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Pixel dimensions of the current diagram page.
///
/// The engine never looks at the pixels; it only sizes its overlay and
/// fits the camera with these numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramSurface {
    pub width: u32,
    pub height: u32,
}

impl DiagramSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Page extent in world units (one world unit per page pixel).
    pub fn bounds(&self) -> Rect {
        self.size().to_rect()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Supplies the rendered page for a diagram.
pub trait SurfaceProvider {
    /// Current page, or `None` while the document is still rendering.
    fn surface(&self) -> Option<DiagramSurface>;
}

use nanotherm_core::{BBox, Point};
use serde::{Deserialize, Serialize};

/// Share of the canvas the fitted layout may fill along its tighter axis.
const FILL: f64 = 0.9;

/// Maps layout coordinates onto a fixed-size canvas. Screen y grows
/// downward, layout y upward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    /// Layout point drawn at the canvas centre.
    pub center: Point,
    /// Pixels per micrometre.
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Canvas of `width` × `height` pixels, one pixel per micrometre,
    /// centred on the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            center: Point::new(0.0, 0.0),
            zoom: 1.0,
            width,
            height,
        }
    }

    /// Centre on `bbox` and zoom so it fills [`FILL`] of the canvas. Boxes
    /// without area leave the viewport unchanged.
    pub fn fit_bbox(&mut self, bbox: &BBox) {
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return;
        }
        self.center = bbox.center();
        self.zoom = FILL * f64::min(self.width / bbox.width(), self.height / bbox.height());
    }

    pub fn layout_to_screen(&self, p: &Point) -> (f64, f64) {
        let dx = (p.x - self.center.x) * self.zoom;
        let dy = (p.y - self.center.y) * self.zoom;
        (self.width / 2.0 + dx, self.height / 2.0 - dy)
    }
}

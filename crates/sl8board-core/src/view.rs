//! View state for pan/zoom transforms.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.25;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 4.0;

/// Zoom and pan of the canvas.
///
/// The pan offset is kept in screen units. Zoom is clamped to
/// [`MIN_ZOOM`]..=[`MAX_ZOOM`] on every write, including deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawViewState")]
pub struct ViewState {
    zoom: f64,
    pan_offset: Vec2,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawViewState {
    zoom: f64,
    #[serde(default)]
    pan_offset: Vec2,
}

impl From<RawViewState> for ViewState {
    fn from(raw: RawViewState) -> Self {
        let mut view = ViewState::default();
        view.set_zoom(raw.zoom);
        view.set_pan_offset(raw.pan_offset);
        view
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_offset: Vec2::ZERO,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan_offset
    }

    /// Set the zoom level, clamped to the allowed range. NaN is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_nan() {
            log::warn!("Ignoring NaN zoom");
            return;
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Set the absolute pan offset in screen units.
    pub fn set_pan_offset(&mut self, offset: Vec2) {
        if !offset.is_finite() {
            log::warn!("Ignoring non-finite pan offset");
            return;
        }
        self.pan_offset = offset;
    }

    /// Pan by a delta in screen units.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.set_pan_offset(self.pan_offset + delta);
    }

    /// Restore zoom 1 and no pan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Canvas to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan_offset) * Affine::scale(self.zoom)
    }

    /// Screen to canvas: `(screen - pan) / zoom`.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan_offset)
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }
}

//! Canvas elements: strokes, text and images.

mod image;
mod stroke;
mod text;

pub use image::{ImageElement, ImageFormat, ImageSize, DEFAULT_IMAGE_SIZE};
pub use stroke::{LineCap, LineJoin, Stroke, StrokeStyle};
pub use text::{FontStyle, FontWeight, TextElement, TextStyle};

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for canvas elements.
///
/// Shaped `<prefix>-<unix millis>-<random suffix>`; split fragments append
/// `-split-<n>` to the id of the stroke they came from.
pub type ElementId = String;

/// Generate a fresh element id with the given prefix.
pub fn generate_id(prefix: &str) -> ElementId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, now_millis(), &suffix[..9])
}

/// Milliseconds since the unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A single input sample in canvas space.
///
/// `timestamp` is the capture time; within one stroke it only ever increases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    pub timestamp: u64,
}

impl StrokePoint {
    pub fn new(x: f64, y: f64, timestamp: u64) -> Self {
        Self {
            x,
            y,
            pressure: None,
            timestamp,
        }
    }

    /// Sample a canvas position now.
    pub fn at(position: Point) -> Self {
        Self::new(position.x, position.y, now_millis())
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure.clamp(0.0, 1.0));
        self
    }

    /// Position as a kurbo point.
    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Same sample moved by the given offset.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

impl From<StrokePoint> for Point {
    fn from(point: StrokePoint) -> Self {
        point.pos()
    }
}

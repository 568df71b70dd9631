//! Image placements.
//!
//! The board never owns image bytes. An [`ImageElement`] only records where
//! an externally stored image (file path or data URI) sits on the canvas.

use super::{ElementId, generate_id, now_millis};
use crate::geometry::BoundingBox;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Size used when the natural size of an imported image is unknown.
pub const DEFAULT_IMAGE_SIZE: ImageSize = ImageSize {
    width: 200.0,
    height: 150.0,
};

/// Image format, detected from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }

    /// Encode raw bytes as a `data:` URI, falling back to an opaque MIME type.
    pub fn data_uri(data: &[u8]) -> String {
        let mime = Self::from_magic_bytes(data)
            .map(|format| format.mime_type())
            .unwrap_or("application/octet-stream");
        format!("data:{};base64,{}", mime, STANDARD.encode(data))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ImageSize {
    fn default() -> Self {
        DEFAULT_IMAGE_SIZE
    }
}

/// An image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    pub id: ElementId,
    pub layer_id: String,
    pub uri: String,
    pub position: Point,
    pub size: ImageSize,
    /// Rotation in degrees. Bounds ignore it.
    #[serde(default)]
    pub rotation: f64,
    pub timestamp: u64,
    pub bounds: BoundingBox,
}

impl ImageElement {
    pub fn new(layer_id: &str, uri: impl Into<String>, position: Point, size: Option<ImageSize>) -> Self {
        let size = size.unwrap_or_default();
        Self {
            id: generate_id("image"),
            layer_id: layer_id.to_string(),
            uri: uri.into(),
            position,
            size,
            rotation: 0.0,
            timestamp: now_millis(),
            bounds: placement_bounds(position, size),
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.bounds = placement_bounds(self.position, self.size);
    }

    pub fn set_size(&mut self, size: ImageSize) {
        self.size = size;
        self.bounds = placement_bounds(self.position, self.size);
    }

    /// Inclusive hit-test against the placement rectangle.
    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }
}

fn placement_bounds(position: Point, size: ImageSize) -> BoundingBox {
    BoundingBox::new(position.x, position.y, size.width, size.height)
}

//! Text elements placed by typing or pasting.

use super::{ElementId, generate_id, now_millis};
use crate::geometry::BoundingBox;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Font size given to pasted text.
pub const PASTED_FONT_SIZE: f64 = 16.0;
/// Font size given to typed text.
pub const TYPED_FONT_SIZE: f64 = 18.0;

/// Approximate glyph advance used for pasted and edited text bounds.
const PASTED_CHAR_WIDTH: f64 = 10.0;
const PASTED_LINE_HEIGHT: f64 = 20.0;
/// Approximate glyph advance used for freshly typed text bounds.
const TYPED_CHAR_WIDTH: f64 = 12.0;
const TYPED_LINE_HEIGHT: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Text styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    pub color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: PASTED_FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            color: "#000000".to_string(),
        }
    }
}

/// A text label on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: ElementId,
    pub layer_id: String,
    pub content: String,
    pub position: Point,
    pub style: TextStyle,
    pub timestamp: u64,
    pub bounds: BoundingBox,
}

impl TextElement {
    fn new(layer_id: &str, content: &str, position: Point, style: TextStyle, char_width: f64, line_height: f64) -> Self {
        Self {
            id: generate_id("text"),
            layer_id: layer_id.to_string(),
            content: content.to_string(),
            position,
            style,
            timestamp: now_millis(),
            bounds: approximate_bounds(position, content, char_width, line_height),
        }
    }

    /// Text arriving from the clipboard, in the default style.
    pub fn pasted(layer_id: &str, content: &str, position: Point) -> Self {
        Self::new(
            layer_id,
            content,
            position,
            TextStyle::default(),
            PASTED_CHAR_WIDTH,
            PASTED_LINE_HEIGHT,
        )
    }

    /// Text typed at a tap location, coloured like the current tool.
    pub fn typed(layer_id: &str, content: &str, position: Point, color: &str) -> Self {
        let style = TextStyle {
            font_size: TYPED_FONT_SIZE,
            color: color.to_string(),
            ..TextStyle::default()
        };
        Self::new(
            layer_id,
            content,
            position,
            style,
            TYPED_CHAR_WIDTH,
            TYPED_LINE_HEIGHT,
        )
    }

    /// Replace the content of an existing element and refresh its bounds.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.bounds = approximate_bounds(self.position, content, PASTED_CHAR_WIDTH, PASTED_LINE_HEIGHT);
    }

    /// Move the element, keeping its extent.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.bounds.x = position.x;
        self.bounds.y = position.y;
    }
}

fn approximate_bounds(position: Point, content: &str, char_width: f64, line_height: f64) -> BoundingBox {
    BoundingBox::new(
        position.x,
        position.y,
        content.chars().count() as f64 * char_width,
        line_height,
    )
}

//! Committed freehand strokes.

use super::{ElementId, StrokePoint, generate_id, now_millis};
use crate::geometry::BoundingBox;
use crate::tools::ToolKind;
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Round,
    Butt,
    Square,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Round,
    Miter,
    Bevel,
}

/// Visual properties of a stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    /// CSS hex colour, e.g. `#000000`.
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    #[serde(default)]
    pub line_cap: LineCap,
    #[serde(default)]
    pub line_join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
            opacity: 1.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
        }
    }
}

/// A freehand stroke.
///
/// Once committed the store treats a stroke as immutable: edits replace the
/// whole record. `bounds` is derived from `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: ElementId,
    pub layer_id: String,
    pub tool: ToolKind,
    pub points: Vec<StrokePoint>,
    pub style: StrokeStyle,
    pub timestamp: u64,
    pub bounds: BoundingBox,
}

impl Stroke {
    /// Start a provisional stroke with a single point.
    pub fn begin(tool: ToolKind, layer_id: &str, style: StrokeStyle, first: StrokePoint) -> Self {
        Self::from_points(generate_id("stroke"), tool, layer_id, style, vec![first])
    }

    /// Build a stroke from existing samples.
    pub fn from_points(
        id: ElementId,
        tool: ToolKind,
        layer_id: &str,
        style: StrokeStyle,
        points: Vec<StrokePoint>,
    ) -> Self {
        let bounds = BoundingBox::from_points(points.iter().map(StrokePoint::pos));
        Self {
            id,
            layer_id: layer_id.to_string(),
            tool,
            points,
            style,
            timestamp: now_millis(),
            bounds,
        }
    }

    /// Append a sample and refresh the bounds.
    pub fn push_point(&mut self, point: StrokePoint) {
        self.points.push(point);
        self.recompute_bounds();
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = BoundingBox::from_points(self.positions());
    }

    /// Sample positions in drawing order.
    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().map(StrokePoint::pos)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline path for a 2D drawing surface.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut positions = self.positions();
        let Some(first) = positions.next() else {
            return path;
        };
        path.move_to(first);
        let mut drew = false;
        for point in positions {
            path.line_to(point);
            drew = true;
        }
        if !drew {
            // A lone tap still needs a visible dot.
            path.line_to(Point::new(first.x + 0.1, first.y));
        }
        path
    }
}

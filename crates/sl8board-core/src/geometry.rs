//! Geometry helpers: bounding boxes, distances and eraser collision tests.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in canvas coordinates.
///
/// Always derived from the owning element's points or placement, never
/// edited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Compute the tight box around a set of points. Empty input yields [`BoundingBox::ZERO`].
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::ZERO;
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Inclusive containment test (points on the edge count as inside).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self::from_rect(self.to_rect().union(other.to_rect()))
    }

    pub fn center(&self) -> Point {
        self.to_rect().center()
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// True when `point` lies inside or on the boundary of the disc.
pub fn within_radius(point: Point, center: Point, radius: f64) -> bool {
    distance(point, center) <= radius
}

/// True when any sample of the polyline falls inside the disc.
///
/// Collision is sampled on the stored points, not on the segments between
/// them, matching how the splitter classifies points.
pub fn polyline_touches_disc<I>(points: I, center: Point, radius: f64) -> bool
where
    I: IntoIterator<Item = Point>,
{
    points
        .into_iter()
        .any(|point| within_radius(point, center, radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_points() {
        let bounds = BoundingBox::from_points([
            Point::new(10.0, 5.0),
            Point::new(-2.0, 8.0),
            Point::new(4.0, 20.0),
        ]);
        assert_eq!(bounds, BoundingBox::new(-2.0, 5.0, 12.0, 15.0));
    }

    #[test]
    fn test_bounds_of_nothing() {
        let bounds = BoundingBox::from_points(std::iter::empty());
        assert_eq!(bounds, BoundingBox::ZERO);
    }

    #[test]
    fn test_single_point_has_zero_extent() {
        let bounds = BoundingBox::from_points([Point::new(3.0, 4.0)]);
        assert_eq!(bounds, BoundingBox::new(3.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bounds = BoundingBox::new(0.0, 0.0, 200.0, 150.0);
        assert!(bounds.contains(Point::new(0.0, 0.0)));
        assert!(bounds.contains(Point::new(200.0, 150.0)));
        assert!(bounds.contains(Point::new(100.0, 75.0)));
        assert!(!bounds.contains(Point::new(200.1, 75.0)));
        assert!(!bounds.contains(Point::new(-0.1, 75.0)));
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, -5.0, 15.0, 15.0));
    }

    #[test]
    fn test_within_radius_boundary() {
        let center = Point::new(2.0, 0.0);
        assert!(within_radius(Point::new(2.5, 0.0), center, 0.5));
        assert!(!within_radius(Point::new(3.0, 0.0), center, 0.5));
        assert!((distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_polyline_touches_disc() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert!(polyline_touches_disc(points, Point::new(9.0, 0.0), 1.5));
        // Midpoint of the segment is not a sample.
        assert!(!polyline_touches_disc(points, Point::new(5.0, 0.0), 1.0));
    }
}

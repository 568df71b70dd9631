//! Eraser collision and stroke splitting.

use crate::elements::{Stroke, StrokePoint};
use crate::geometry::{polyline_touches_disc, within_radius};
use kurbo::Point;

/// Eraser footprint radius for a given tool width.
pub fn eraser_radius(width: f64) -> f64 {
    width / 2.0
}

/// True when any point of the stroke lies inside the eraser disc.
pub fn collides(stroke: &Stroke, center: Point, radius: f64) -> bool {
    // Cheap reject on the inflated bounds before walking every point.
    let reach = stroke.bounds.to_rect().inflate(radius, radius);
    if !reach.contains(center) {
        return false;
    }
    polyline_touches_disc(stroke.positions(), center, radius)
}

/// Split `stroke` around an eraser disc.
///
/// Points inside the disc are dropped; each maximal run of surviving points
/// with at least two samples becomes a fragment that keeps the original
/// style and layer and gets the id `<original>-split-<n>`.
pub fn split_stroke(stroke: &Stroke, center: Point, radius: f64) -> Vec<Stroke> {
    let mut fragments = Vec::new();
    let mut run: Vec<StrokePoint> = Vec::new();

    for point in &stroke.points {
        if within_radius(point.pos(), center, radius) {
            flush_run(stroke, &mut run, &mut fragments);
        } else {
            run.push(*point);
        }
    }
    flush_run(stroke, &mut run, &mut fragments);

    fragments
}

fn flush_run(stroke: &Stroke, run: &mut Vec<StrokePoint>, fragments: &mut Vec<Stroke>) {
    let points = std::mem::take(run);
    if points.len() < 2 {
        return;
    }
    let mut fragment = Stroke::from_points(
        format!("{}-split-{}", stroke.id, fragments.len()),
        stroke.tool,
        &stroke.layer_id,
        stroke.style.clone(),
        points,
    );
    fragment.timestamp = stroke.timestamp;
    fragments.push(fragment);
}

//! Planar geometry helpers: points, distances and nearest-point search.

use serde::{Deserialize, Serialize};

/// A position on the simulation plane.
///
/// The world is conceptually the unit square, but nothing clamps
/// positions: blobs may wander past the edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        distance(*self, *other)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Find the point in `coords` closest to `origin`.
///
/// Returns the index of the closest point and its distance, or `None`
/// when `coords` is empty. Ties go to the earliest index.
pub fn closest(origin: Point, coords: &[Point]) -> Option<(usize, f64)> {
    coords
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, distance(origin, *c)))
        .fold(None, |best, (idx, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((idx, dist)),
        })
}

/// Unit sign used by the seek rule: `+1` when `from < to`, `-1` otherwise.
#[inline]
fn seek_sign(from: f64, to: f64) -> f64 {
    if from < to {
        1.0
    } else {
        -1.0
    }
}

/// Step `step` along each axis toward `target`.
pub fn step_toward(from: Point, target: Point, step: f64) -> Point {
    Point {
        x: from.x + step * seek_sign(from.x, target.x),
        y: from.y + step * seek_sign(from.y, target.y),
    }
}

/// Step `step` along each axis away from `threat` (the negated seek rule).
pub fn step_away(from: Point, threat: Point, step: f64) -> Point {
    Point {
        x: from.x - step * seek_sign(from.x, threat.x),
        y: from.y - step * seek_sign(from.y, threat.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let d = distance(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        assert!((d - 2.0f64.sqrt()).abs() < 1e-12);

        let d = distance(Point::new(0.3, 0.4), Point::new(0.0, 0.0));
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closest_picks_nearest() {
        let food = [
            Point::new(0.01, 0.01),
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        let (idx, dist) = closest(Point::new(0.0, 0.0), &food).unwrap();
        assert_eq!(idx, 0);
        assert!(dist < 0.02);
    }

    #[test]
    fn test_closest_tie_goes_to_first() {
        let food = [Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
        let (idx, _) = closest(Point::new(0.0, 0.0), &food).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_closest_empty() {
        assert!(closest(Point::new(0.5, 0.5), &[]).is_none());
    }

    #[test]
    fn test_step_toward_and_away() {
        let from = Point::new(0.5, 0.5);
        let target = Point::new(0.9, 0.1);

        let toward = step_toward(from, target, 0.1);
        assert!((toward.x - 0.6).abs() < 1e-12);
        assert!((toward.y - 0.4).abs() < 1e-12);

        let away = step_away(from, target, 0.1);
        assert!((away.x - 0.4).abs() < 1e-12);
        assert!((away.y - 0.6).abs() < 1e-12);
    }
}

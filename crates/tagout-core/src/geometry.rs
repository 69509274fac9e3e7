//! Geometry kernel: distances, hit-testing and bounds over polylines.
//!
//! Everything here is a pure function over world-space coordinates.
//! Callers convert view pixels with [`Camera::screen_to_world`](crate::Camera::screen_to_world)
//! before asking anything of this module, so thresholds are zoom independent.

use kurbo::{Point, Rect, Vec2};

/// Anything drawn as an ordered run of connected points.
pub trait Polyline {
    fn points(&self) -> &[Point];
}

impl Polyline for Vec<Point> {
    fn points(&self) -> &[Point] {
        self
    }
}

/// Distance from a point to the segment `a`→`b`.
///
/// The projection is clamped to the segment, so points beyond either end
/// measure to the nearer endpoint. A zero-length segment is a point.
pub fn distance_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
///
/// A single vertex measures as a point; an empty polyline is infinitely far.
pub fn polyline_distance(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Return the first item whose polyline lies within `threshold` of `point`.
///
/// Items are visited in iteration order and the first match wins, so
/// earlier items take precedence where shapes overlap.
pub fn hit_test<'a, T, I>(point: Point, items: I, threshold: f64) -> Option<&'a T>
where
    T: Polyline + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .find(|item| polyline_distance(point, item.points()) <= threshold)
}

/// Axis-aligned bounds of a point run, or `None` when it is empty.
pub fn polyline_bounds(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    let start = Rect::from_points(*first, *first);
    Some(rest.iter().fold(start, |r, p| r.union_pt(*p)))
}

/// Concatenate strokes in draw order into a single point run.
pub fn flatten_strokes<'a, I>(strokes: I) -> Vec<Point>
where
    I: IntoIterator<Item = &'a [Point]>,
{
    strokes.into_iter().flatten().copied().collect()
}

/// Whether `candidate` is strictly farther than `spacing` from `last`.
pub fn far_enough(last: Point, candidate: Point, spacing: f64) -> bool {
    last.distance(candidate) > spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_distance_on_segment_is_zero() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 50.0);
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let on = a.lerp(b, t);
            assert!(distance_to_segment(on, a, b) < EPS);
        }
    }

    #[test]
    fn test_distance_beyond_ends_uses_nearer_endpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(Point::new(-3.0, 4.0), a, b) - 5.0).abs() < EPS);
        assert!((distance_to_segment(Point::new(13.0, -4.0), a, b) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_distance_perpendicular() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(Point::new(5.0, 7.0), a, b) - 7.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_segment() {
        let a = Point::new(2.0, 2.0);
        assert!((distance_to_segment(Point::new(5.0, 6.0), a, a) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_polyline_distance_edge_cases() {
        assert!(polyline_distance(Point::ZERO, &[]).is_infinite());
        let single = [Point::new(3.0, 4.0)];
        assert!((polyline_distance(Point::ZERO, &single) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_hit_test_first_wins() {
        let first = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let second = vec![Point::new(0.0, 2.0), Point::new(100.0, 2.0)];
        let shapes = vec![first, second];

        let hit = hit_test(Point::new(50.0, 1.0), &shapes, 5.0);
        assert!(std::ptr::eq(hit.unwrap(), &shapes[0]));

        // Same inputs, same answer.
        let again = hit_test(Point::new(50.0, 1.0), &shapes, 5.0);
        assert!(std::ptr::eq(again.unwrap(), &shapes[0]));
    }

    #[test]
    fn test_hit_test_miss_and_threshold_inclusive() {
        let shapes = vec![vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]];
        assert!(hit_test(Point::new(5.0, 20.0), &shapes, 5.0).is_none());
        assert!(hit_test(Point::new(5.0, 5.0), &shapes, 5.0).is_some());
    }

    #[test]
    fn test_hit_test_polyline_middle_segment() {
        let shapes = vec![vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]];
        assert!(hit_test(Point::new(11.0, 5.0), &shapes, 2.0).is_some());
    }

    #[test]
    fn test_bounds() {
        assert!(polyline_bounds(&[]).is_none());
        let r = polyline_bounds(&[
            Point::new(10.0, 20.0),
            Point::new(-5.0, 40.0),
            Point::new(3.0, 0.0),
        ])
        .unwrap();
        assert_eq!(r, Rect::new(-5.0, 0.0, 10.0, 40.0));
    }

    #[test]
    fn test_flatten_keeps_draw_order() {
        let a = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let b = vec![Point::new(5.0, 5.0)];
        let flat = flatten_strokes([a.as_slice(), b.as_slice()]);
        assert_eq!(flat, vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_far_enough_is_strict() {
        let p = Point::new(0.0, 0.0);
        assert!(!far_enough(p, Point::new(3.0, 0.0), 3.0));
        assert!(far_enough(p, Point::new(3.1, 0.0), 3.0));
    }
}

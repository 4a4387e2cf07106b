//! Distance queries and spline evaluation for the level 3 track
//!
//! The road is a closed polyline, so containment and obstacle contact both
//! reduce to point-to-segment distances.

use glam::Vec2;

/// Squared distance from `p` to the segment `a`-`b`
///
/// Degenerate segments (a == b) measure distance to the point `a`.
pub fn dist_point_to_segment_squared(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len_sq = ab.length_squared();

    let t = if ab_len_sq > 0.0 {
        (ap.dot(ab) / ab_len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let closest = a + ab * t;
    (p - closest).length_squared()
}

/// Distance from `p` to the segment `a`-`b`
#[inline]
pub fn dist_point_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    dist_point_to_segment_squared(p, a, b).sqrt()
}

/// Distance from `p` to the nearest edge of a closed polyline
///
/// The last point connects back to the first. An empty polyline is
/// infinitely far away.
pub fn distance_to_closed_polyline(p: Vec2, points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut min_sq = f32::INFINITY;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        min_sq = min_sq.min(dist_point_to_segment_squared(p, a, b));
    }
    min_sq.sqrt()
}

/// Evaluate a uniform Catmull-Rom segment between `p1` and `p2` at `t` in [0, 1]
pub fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;

    0.5 * (2.0 * p1
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Unit normal to the curve at sample `idx`, from the tangent through its neighbours
pub fn curve_normal(points: &[Vec2], idx: usize) -> Vec2 {
    let n = points.len();
    let prev = points[(idx + n - 1) % n];
    let next = points[(idx + 1) % n];
    let tangent = next - prev;
    let angle = tangent.y.atan2(tangent.x);
    Vec2::new(-angle.sin(), angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance_projection() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(dist_point_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0);
        // Beyond the end clamps to the endpoint
        assert_eq!(dist_point_to_segment(Vec2::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(dist_point_to_segment(Vec2::new(-3.0, -4.0), a, b), 5.0);
    }

    #[test]
    fn test_degenerate_segment() {
        let a = Vec2::new(2.0, 2.0);
        assert_eq!(dist_point_to_segment_squared(Vec2::new(5.0, 6.0), a, a), 25.0);
    }

    #[test]
    fn test_closed_polyline_includes_wrap_edge() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        // Closest to the closing edge (0,10)-(0,0)
        let d = distance_to_closed_polyline(Vec2::new(-2.0, 5.0), &square);
        assert!((d - 2.0).abs() < 1e-6);
        assert!(distance_to_closed_polyline(Vec2::ZERO, &[]).is_infinite());
    }

    #[test]
    fn test_catmull_rom_endpoints() {
        let p0 = Vec2::new(-1.0, 0.0);
        let p1 = Vec2::new(0.0, 0.0);
        let p2 = Vec2::new(1.0, 1.0);
        let p3 = Vec2::new(2.0, 1.0);
        assert!((catmull_rom(p0, p1, p2, p3, 0.0) - p1).length() < 1e-6);
        assert!((catmull_rom(p0, p1, p2, p3, 1.0) - p2).length() < 1e-6);
    }

    #[test]
    fn test_curve_normal_perpendicular() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 0.0),
        ];
        let n = curve_normal(&pts, 1);
        assert!(n.x.abs() < 1e-6);
        assert!((n.y - 1.0).abs() < 1e-6);
    }
}

//! Basic geometry primitives for TIN operations.

mod extents;
mod point;
mod point3;

pub use extents::Extents;
pub use point::Point;
pub use point3::Point3;

/// Calculates the Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// 2D cross product of two plan vectors.
pub fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Twice the signed area of the triangle `a`, `b`, `c`. Positive when the
/// points turn counter-clockwise, i.e. `c` lies left of the directed line
/// `a`-`b`.
pub fn signed_area(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Returns the unit vector of `v`, or `None` for a zero-length vector.
pub fn unit(v: Point) -> Option<Point> {
    let len = (v.x * v.x + v.y * v.y).sqrt();
    if len <= f64::EPSILON {
        None
    } else {
        Some(Point::new(v.x / len, v.y / len))
    }
}

/// Barycentric weights of `p` with respect to the plan projection of the
/// triangle `a`, `b`, `c`. `None` for a degenerate triangle.
pub fn barycentric(p: Point, a: Point3, b: Point3, c: Point3) -> Option<(f64, f64, f64)> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det.abs() < f64::EPSILON {
        return None;
    }
    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
    let w = 1.0 - u - v;
    Some((u, v, w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_three_four_five() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn signed_area_orientation() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        assert!(signed_area(a, b, Point::new(0.0, 1.0)) > 0.0);
        assert!(signed_area(a, b, Point::new(0.0, -1.0)) < 0.0);
        assert_eq!(signed_area(a, b, Point::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn barycentric_weights_sum_to_one() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let (u, v, w) = barycentric(Point::new(0.25, 0.25), a, b, c).unwrap();
        assert!((u + v + w - 1.0).abs() < 1e-12);
        assert!((u - 0.5).abs() < 1e-12);
        assert!(barycentric(Point::new(0.0, 0.0), a, a, c).is_none());
    }

    #[test]
    fn unit_rejects_zero() {
        assert!(unit(Point::new(0.0, 0.0)).is_none());
        assert_eq!(unit(Point::new(0.0, 2.0)), Some(Point::new(0.0, 1.0)));
    }
}

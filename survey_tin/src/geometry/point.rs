//! Basic 2D point type used throughout the crate.

/// Representation of a 2D (plan) point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the point displaced by `dir` scaled by `t`.
    pub fn offset(self, dir: Point, t: f64) -> Self {
        Self::new(self.x + dir.x * t, self.y + dir.y * t)
    }

    /// Vector from `other` to `self`.
    pub fn sub(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

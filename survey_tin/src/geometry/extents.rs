//! Axis-aligned bounding boxes.

use super::{Point, Point3};

/// Axis-aligned 3D bounding box. A box with `min > max` is invalid and is
/// what an empty sweep produces.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extents {
    pub min: Point3,
    pub max: Point3,
}

impl Extents {
    /// The empty box. Including any point makes it valid.
    pub const INVALID: Extents = Extents {
        min: Point3 {
            x: f64::INFINITY,
            y: f64::INFINITY,
            z: f64::INFINITY,
        },
        max: Point3 {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
            z: f64::NEG_INFINITY,
        },
    };

    /// Returns `true` once at least one point has been included.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Grows the box to contain `p`.
    pub fn include(&mut self, p: Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Returns `true` if the plan position lies inside or on the box.
    pub fn contains_xy(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Clips the plan segment `a`-`b` against the box (Liang-Barsky) and
    /// returns the parameter range `(t0, t1)` of the part inside it.
    pub fn clip_segment(&self, a: Point, b: Point) -> Option<(f64, f64)> {
        if !self.is_valid() {
            return None;
        }
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-dx, a.x - self.min.x),
            (dx, self.max.x - a.x),
            (-dy, a.y - self.min.y),
            (dy, self.max.y - a.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }
        (t0 <= t1).then_some((t0, t1))
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::INVALID
    }
}

//! Point location by a directed walk across neighbour links.

use std::collections::{HashSet, VecDeque};

use super::Tin;
use crate::error::LocateError;
use crate::geometry::{signed_area, Point};

impl Tin {
    /// Finds the triangle containing the plan position `point`.
    ///
    /// The walk starts at `hint` when it is a valid index, otherwise at the
    /// cached seed. A point on a shared edge or vertex resolves to the
    /// lowest-indexed triangle containing it, whatever the start. Inactive
    /// triangles are rejected unless `allow_inactive` is set.
    pub fn locate(
        &self,
        point: Point,
        allow_inactive: bool,
        hint: Option<usize>,
    ) -> Result<usize, LocateError> {
        if self.triangles.is_empty() {
            return Err(LocateError::EmptyMesh);
        }
        let count = self.triangles.len();
        let start = hint.filter(|&h| h < count).unwrap_or_else(|| {
            let seed = self.seed();
            if seed < count {
                seed
            } else {
                0
            }
        });
        let found = self.walk_to(point, start)?;
        let resolved = self.resolve_tie(point, found, allow_inactive)?;
        self.remember_seed(resolved);
        Ok(resolved)
    }

    /// Locates an active triangle under `point`.
    pub fn locate_point(&self, point: Point) -> Result<usize, LocateError> {
        self.locate(point, false, None)
    }

    /// Locates an active triangle under (x, y).
    pub fn locate_xy(&self, x: f64, y: f64) -> Result<usize, LocateError> {
        self.locate(Point::new(x, y), false, None)
    }

    /// Returns the interpolated elevation at (x, y).
    pub fn height_at(&self, x: f64, y: f64) -> Result<f64, LocateError> {
        let t = self.locate_xy(x, y)?;
        self.interpolate_z(t, Point::new(x, y))
            .ok_or(LocateError::DegenerateTriangle(t))
    }

    /// Walks from `start` towards `p`. Each step scans the edges after the
    /// one the walk entered through and crosses the first edge `p` lies
    /// strictly outside of.
    fn walk_to(&self, p: Point, start: usize) -> Result<usize, LocateError> {
        let mut current = start;
        let mut entry: Option<usize> = None;
        for _ in 0..self.walk_limit() {
            let corners = self.plan_corners(current);
            let first = entry.map_or(0, |e| e + 1);
            let exit = (0..3)
                .map(|k| (first + k) % 3)
                .filter(|&e| Some(e) != entry)
                .find(|&e| signed_area(p, corners[e], corners[(e + 1) % 3]) < 0.0);
            let Some(e) = exit else {
                return Ok(current);
            };
            let tri = &self.triangles[current];
            match tri.neighbors[e] {
                Some(n) if n < self.triangles.len() => {
                    entry = Some(tri.back[e] as usize % 3);
                    current = n;
                }
                Some(_) => {
                    return Err(LocateError::InvalidNeighbor {
                        triangle: current,
                        edge: e,
                    })
                }
                None => {
                    return Err(LocateError::OutsideMesh {
                        triangle: current,
                        edge: e,
                    })
                }
            }
        }
        Err(LocateError::WalkLimitExceeded(self.walk_limit()))
    }

    /// Lowest-indexed triangle containing `p`, found by checking every
    /// triangle. Unlike [`Tin::locate`] this does not stop at a concave
    /// boundary.
    pub(crate) fn find_containing(&self, p: Point, allow_inactive: bool) -> Option<usize> {
        (0..self.triangles.len()).find(|&t| {
            (allow_inactive || self.triangles[t].is_active()) && self.contains(t, p)
        })
    }

    fn contains(&self, t: usize, p: Point) -> bool {
        let c = self.plan_corners(t);
        (0..3).all(|e| signed_area(p, c[e], c[(e + 1) % 3]) >= 0.0)
    }

    /// Gathers every triangle reachable from `found` across edges `p` lies
    /// exactly on and picks the lowest index.
    fn resolve_tie(
        &self,
        p: Point,
        found: usize,
        allow_inactive: bool,
    ) -> Result<usize, LocateError> {
        let on_edge = |t: usize| {
            let c = self.plan_corners(t);
            (0..3).filter(move |&e| signed_area(p, c[e], c[(e + 1) % 3]) == 0.0)
        };
        let usable = |t: usize| allow_inactive || self.triangles[t].is_active();

        if on_edge(found).next().is_none() {
            return if usable(found) {
                Ok(found)
            } else {
                Err(LocateError::Inactive(found))
            };
        }

        let mut seen = HashSet::from([found]);
        let mut queue = VecDeque::from([found]);
        while let Some(t) = queue.pop_front() {
            for e in on_edge(t) {
                if let Some(n) = self.triangles[t].neighbors[e] {
                    if n < self.triangles.len() && seen.insert(n) && self.contains(n, p) {
                        queue.push_back(n);
                    }
                }
            }
        }
        seen.retain(|&t| self.contains(t, p));
        seen.into_iter()
            .filter(|&t| usable(t))
            .min()
            .ok_or(LocateError::Inactive(found))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{grid, l_shape, unit_square};
    use super::super::{Triangle, TriangleFlags};
    use super::*;
    use crate::geometry::Point3;

    #[test]
    fn locate_unit_square_centre() {
        let tin = unit_square();
        let t = tin.locate_xy(0.5, 0.5).unwrap();
        assert!(t < 2);
        assert_eq!(tin.height_at(0.5, 0.5).unwrap(), 0.0);
        assert_eq!(tin.seed(), t);
    }

    #[test]
    fn interior_points_found_from_any_hint() {
        let tin = grid(6, 1.0, |x, y| x * 0.1 + y);
        let p = Point::new(4.3, 2.6);
        let expected = tin.locate(p, false, Some(0)).unwrap();
        for hint in 0..tin.triangle_count() {
            assert_eq!(tin.locate(p, false, Some(hint)).unwrap(), expected);
        }
        let [a, b, c] = tin.plan_corners(expected);
        assert!(signed_area(a, b, p) > 0.0);
        assert!(signed_area(b, c, p) > 0.0);
        assert!(signed_area(c, a, p) > 0.0);
    }

    #[test]
    fn shared_edge_resolves_deterministically() {
        let tin = unit_square();
        // (0.5, 0.5) lies on the diagonal shared by both triangles.
        let from_first = tin.locate(Point::new(0.5, 0.5), false, Some(0)).unwrap();
        let from_second = tin.locate(Point::new(0.5, 0.5), false, Some(1)).unwrap();
        assert_eq!(from_first, 0);
        assert_eq!(from_second, 0);

        let tin = grid(4, 1.0, |_, _| 0.0);
        let vertex = Point::new(2.0, 2.0);
        let results: Vec<usize> = (0..tin.triangle_count())
            .map(|h| tin.locate(vertex, false, Some(h)).unwrap())
            .collect();
        assert!(results.iter().all(|&t| t == results[0]));
    }

    #[test]
    fn tilted_plane_height() {
        let g = 0.35;
        let tin = grid(2, 1.0, |x, _| x * g);
        let z = tin.height_at(0.5, 0.5).unwrap();
        assert!((z - 0.5 * g).abs() < 1e-6);
        let z = tin.height_at(1.75, 0.2).unwrap();
        assert!((z - 1.75 * g).abs() < 1e-6);
    }

    #[test]
    fn outside_point_fails() {
        let tin = unit_square();
        assert!(matches!(
            tin.locate_xy(2.0, 0.5),
            Err(LocateError::OutsideMesh { .. })
        ));
        assert_eq!(Tin::default().locate_xy(0.0, 0.0), Err(LocateError::EmptyMesh));
    }

    #[test]
    fn inactive_triangle_rejected_unless_allowed() {
        let mut tin = unit_square();
        let p = Point::new(0.75, 0.25);
        let t = tin.locate_point(p).unwrap();
        tin.clear_flag(t, TriangleFlags::ACTIVE).unwrap();
        assert_eq!(tin.locate_point(p), Err(LocateError::Inactive(t)));
        assert_eq!(tin.locate(p, true, None), Ok(t));
    }

    #[test]
    fn shared_edge_prefers_active_neighbour() {
        let mut tin = unit_square();
        tin.clear_flag(0, TriangleFlags::ACTIVE).unwrap();
        assert_eq!(tin.locate_xy(0.5, 0.5), Ok(1));
    }

    #[test]
    fn concave_mesh_scan_finds_what_the_walk_misses() {
        let tin = l_shape();
        let far = tin.locate_xy(1.8, 0.2).unwrap();
        let p = Point::new(0.2, 1.2);
        assert!(matches!(
            tin.locate(p, true, Some(far)),
            Err(LocateError::OutsideMesh { .. })
        ));
        let t = tin.find_containing(p, true).unwrap();
        assert_eq!(tin.locate(p, true, Some(t)), Ok(t));
        assert_eq!(tin.find_containing(Point::new(1.5, 1.5), true), None);
    }

    #[test]
    fn cyclic_adjacency_hits_walk_limit() {
        // Two triangles whose links send the walk back and forth forever.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(11.0, 10.0, 0.0),
            Point3::new(10.0, 11.0, 0.0),
        ];
        let mut a = Triangle::new([0, 1, 2]);
        let mut b = Triangle::new([3, 4, 5]);
        a.neighbors = [Some(1); 3];
        b.neighbors = [Some(0); 3];
        let tin = Tin::new(vertices, vec![a, b]);
        assert_eq!(
            tin.locate_xy(5.0, 5.0),
            Err(LocateError::WalkLimitExceeded(3))
        );
    }
}

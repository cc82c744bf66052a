//! Cross-sections: elevation profiles along plan lines over a [`Tin`].
//!
//! A section walks the triangles under the line, emitting a node wherever the
//! line crosses a triangle edge. Lines that start or end off the mesh are
//! clipped where they cross the mesh boundary.

use serde::{Deserialize, Serialize};

use crate::dtm::{Tin, TriangleFlags};
use crate::error::{LocateError, SectionError};
use crate::geometry::{cross, distance, signed_area, Point, Point3};

/// One sample of a cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionNode {
    pub position: Point3,
    /// Plan distance along the section from its first node.
    pub distance: f64,
    /// Triangle the section passes through before reaching this node.
    pub triangle: usize,
    pub layer: u8,
    pub flags: TriangleFlags,
}

/// Tuning for [`Tin::section_with`] and [`Tin::section_polyline_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionOptions {
    /// Drop crossing nodes that lie on a straight run between their
    /// neighbours when the faces either side share layer and flags.
    pub merge_collinear: bool,
    /// Plan distance below which two nodes are considered the same.
    pub tolerance: f64,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            merge_collinear: true,
            tolerance: 1e-9,
        }
    }
}

/// Where the walk currently stands.
struct Cursor {
    triangle: usize,
    /// Parameter along the segment, 0 at its start and 1 at its end.
    t: f64,
    /// Local edge the walk entered through.
    entry: Option<usize>,
    /// Vertex the walk is pivoting on after a fan rotation.
    pivot: Option<usize>,
}

/// Intersection of the segment with a boundary edge.
struct BoundaryCrossing {
    t: f64,
    triangle: usize,
    edge: usize,
    point: Point,
    /// The segment passes from outside the mesh to inside.
    entering: bool,
}

/// Slack on the edge parameter so crossings through a boundary vertex are
/// reported by both edges meeting there.
const EDGE_SLACK: f64 = 1e-12;

fn node(tin: &Tin, triangle: usize, position: Point3, distance: f64) -> CrossSectionNode {
    let (layer, flags) = tin
        .triangle(triangle)
        .map_or((0, TriangleFlags::empty()), |t| (t.layer, t.flags));
    CrossSectionNode {
        position,
        distance,
        triangle,
        layer,
        flags,
    }
}

fn lerp3(a: Point3, b: Point3, u: f64) -> Point3 {
    Point3::new(
        a.x + (b.x - a.x) * u,
        a.y + (b.y - a.y) * u,
        a.z + (b.z - a.z) * u,
    )
}

impl Tin {
    /// Samples the surface along the plan segment `p0`-`p1`.
    pub fn section(&self, p0: Point, p1: Point) -> Result<Vec<CrossSectionNode>, SectionError> {
        self.section_with(p0, p1, &SectionOptions::default())
    }

    /// [`Tin::section`] with explicit options.
    pub fn section_with(
        &self,
        p0: Point,
        p1: Point,
        options: &SectionOptions,
    ) -> Result<Vec<CrossSectionNode>, SectionError> {
        let mut nodes = self.section_segment(p0, p1, options)?;
        rebase(&mut nodes);
        Ok(nodes)
    }

    /// Samples the surface along a plan polyline. Distances run along the
    /// whole path.
    pub fn section_polyline(&self, points: &[Point]) -> Result<Vec<CrossSectionNode>, SectionError> {
        self.section_polyline_with(points, &SectionOptions::default())
    }

    /// [`Tin::section_polyline`] with explicit options.
    pub fn section_polyline_with(
        &self,
        points: &[Point],
        options: &SectionOptions,
    ) -> Result<Vec<CrossSectionNode>, SectionError> {
        if points.len() < 2 {
            return Err(SectionError::TooFewPoints(points.len()));
        }
        let mut out: Vec<CrossSectionNode> = Vec::new();
        let mut offset = 0.0;
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let len = distance(a, b);
            if len <= options.tolerance {
                continue;
            }
            // A shared vertex ends one segment and starts the next; the
            // second node replaces the first.
            for mut n in self.section_segment(a, b, options)? {
                n.distance += offset;
                push_increasing(&mut out, n, options.tolerance);
            }
            offset += len;
        }
        if out.is_empty() {
            return Err(SectionError::DegenerateSegment);
        }
        rebase(&mut out);
        log::debug!(
            "polyline section over {} vertices produced {} nodes",
            points.len(),
            out.len()
        );
        Ok(out)
    }

    /// Sections one segment. Distances are measured from `a` itself, not
    /// from the clipped start.
    fn section_segment(
        &self,
        a: Point,
        b: Point,
        options: &SectionOptions,
    ) -> Result<Vec<CrossSectionNode>, SectionError> {
        let dir = b.sub(a);
        let len = distance(a, b);
        if len <= options.tolerance {
            return Err(SectionError::DegenerateSegment);
        }
        let extents = self.extents();
        if extents.clip_segment(a, b).is_none() {
            return Err(SectionError::NeverEntersMesh);
        }
        let eps = options.tolerance / len;
        let snap = options.tolerance.max(len * 1e-12);
        let crossings = self.boundary_crossings(a, dir);
        let mut visits = 1;

        let located = if extents.contains_xy(a) {
            match self.locate(a, true, None) {
                Ok(t) => Some(t),
                // The walk stops at concave boundaries.
                Err(LocateError::OutsideMesh { .. }) => self.find_containing(a, true),
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };
        let (mut cursor, start) = match located {
            Some(t) => {
                let cursor = Cursor {
                    triangle: t,
                    t: 0.0,
                    entry: None,
                    pivot: None,
                };
                (cursor, a)
            }
            None => self.enter(&crossings, dir, snap, &mut visits)?,
        };

        let start_z = self
            .interpolate_z(cursor.triangle, start)
            .ok_or(SectionError::DegenerateTriangle(cursor.triangle))?;
        let mut nodes = vec![node(
            self,
            cursor.triangle,
            Point3::new(start.x, start.y, start_z),
            cursor.t * len,
        )];

        let limit = self.walk_limit();
        loop {
            if visits > limit {
                return Err(SectionError::VisitLimitExceeded(limit));
            }
            let current = cursor.triangle;
            let Some((edge, te)) = self.exit_edge(&cursor, a, dir, eps) else {
                return Err(SectionError::DegenerateTriangle(current));
            };
            if te >= 1.0 - eps {
                let z = self
                    .interpolate_z(current, b)
                    .ok_or(SectionError::DegenerateTriangle(current))?;
                nodes.push(node(self, current, Point3::new(b.x, b.y, z), len));
                break;
            }

            let c = self.corners(current);
            let (p, q) = (c[edge], c[(edge + 1) % 3]);
            let hit = a.offset(dir, te);
            if let Some(k) = self.touched_corner(current, edge, hit, snap) {
                nodes.push(node(self, current, c[k], te * len));
                match self.fan_to(current, k, dir, false, &mut visits)? {
                    Some(next) => {
                        log::trace!("section pivots on vertex of triangle {current} into {next}");
                        cursor = Cursor {
                            triangle: next,
                            t: te,
                            entry: None,
                            pivot: Some(self.triangles()[current].vertices[k]),
                        };
                    }
                    None if reenters(&crossings, te, eps) => {
                        return Err(SectionError::LeftMesh {
                            triangle: current,
                            edge,
                        })
                    }
                    None => break,
                }
            } else {
                let u = edge_parameter(p.xy(), q.xy(), a, dir).map_or(0.0, |u| u.clamp(0.0, 1.0));
                nodes.push(node(self, current, lerp3(p, q, u), te * len));
                let tri = &self.triangles()[current];
                match tri.neighbors[edge] {
                    Some(next) if next < self.triangle_count() => {
                        cursor = Cursor {
                            triangle: next,
                            t: te,
                            entry: Some(tri.back[edge] as usize % 3),
                            pivot: None,
                        };
                    }
                    None if !reenters(&crossings, te, eps) => break,
                    _ => {
                        return Err(SectionError::LeftMesh {
                            triangle: current,
                            edge,
                        })
                    }
                }
            }
            visits += 1;
        }

        let nodes = tidy(nodes, options);
        if nodes.len() < 2 {
            // Only touches the mesh at a single point.
            return Err(SectionError::NeverEntersMesh);
        }
        log::trace!("segment section produced {} nodes", nodes.len());
        Ok(nodes)
    }

    /// Every crossing of the segment `a + t * dir`, `t` in `[0, 1]`, with a
    /// boundary edge.
    fn boundary_crossings(&self, a: Point, dir: Point) -> Vec<BoundaryCrossing> {
        let mut out = Vec::new();
        for (t, tri) in self.triangles().iter().enumerate() {
            let c = self.plan_corners(t);
            for e in 0..3 {
                if tri.neighbors[e].is_some() {
                    continue;
                }
                let (p, q) = (c[e], c[(e + 1) % 3]);
                let Some(u) = edge_parameter(p, q, a, dir) else {
                    continue;
                };
                let rate = cross(q.sub(p), dir);
                let s = -signed_area(p, q, a) / rate;
                if (0.0..=1.0).contains(&s) && (-EDGE_SLACK..=1.0 + EDGE_SLACK).contains(&u) {
                    out.push(BoundaryCrossing {
                        t: s,
                        triangle: t,
                        edge: e,
                        point: a.offset(dir, s),
                        entering: rate > 0.0,
                    });
                }
            }
        }
        log::trace!("{} boundary crossings", out.len());
        out
    }

    /// Start of a segment that begins off the mesh: the earliest boundary
    /// crossing that leads into a face. Vertices the line only grazes are
    /// passed over.
    fn enter(
        &self,
        crossings: &[BoundaryCrossing],
        dir: Point,
        snap: f64,
        visits: &mut usize,
    ) -> Result<(Cursor, Point), SectionError> {
        let mut entries: Vec<&BoundaryCrossing> = crossings.iter().filter(|c| c.entering).collect();
        entries.sort_by(|x, y| x.t.total_cmp(&y.t));
        for c in entries {
            let Some(k) = self.touched_corner(c.triangle, c.edge, c.point, snap) else {
                let cursor = Cursor {
                    triangle: c.triangle,
                    t: c.t,
                    entry: Some(c.edge),
                    pivot: None,
                };
                return Ok((cursor, c.point));
            };
            if let Some(t) = self.fan_to(c.triangle, k, dir, true, visits)? {
                let v = self.triangles()[c.triangle].vertices[k];
                let cursor = Cursor {
                    triangle: t,
                    t: c.t,
                    entry: None,
                    pivot: Some(v),
                };
                return Ok((cursor, self.vertices()[v].xy()));
            }
        }
        Err(SectionError::NeverEntersMesh)
    }

    /// Edge the line leaves the cursor's triangle through, with the line
    /// parameter at the crossing. Crossings behind the cursor are ignored.
    fn exit_edge(&self, cursor: &Cursor, a: Point, dir: Point, eps: f64) -> Option<(usize, f64)> {
        let tri = &self.triangles()[cursor.triangle];
        let c = self.plan_corners(cursor.triangle);
        (0..3)
            .filter(|&e| Some(e) != cursor.entry)
            .filter(|&e| {
                let (v0, v1) = tri.edge(e);
                cursor.pivot.map_or(true, |v| v != v0 && v != v1)
            })
            .filter_map(|e| {
                let (p, q) = (c[e], c[(e + 1) % 3]);
                let rate = cross(q.sub(p), dir);
                if rate >= 0.0 {
                    return None;
                }
                let te = -signed_area(p, q, a) / rate;
                (te >= cursor.t - eps).then_some((e, te.max(cursor.t)))
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
    }

    /// Corner of `triangle` that `hit` on `edge` coincides with, if any.
    fn touched_corner(&self, triangle: usize, edge: usize, hit: Point, snap: f64) -> Option<usize> {
        let c = self.plan_corners(triangle);
        [edge, (edge + 1) % 3]
            .into_iter()
            .find(|&k| distance(c[k], hit) <= snap)
    }

    /// Rotates around corner `k` of `start` until a face whose wedge at that
    /// vertex contains `dir`. Counter-clockwise first, then clockwise.
    fn fan_to(
        &self,
        start: usize,
        k: usize,
        dir: Point,
        include_start: bool,
        visits: &mut usize,
    ) -> Result<Option<usize>, SectionError> {
        let vertex = self.triangles()[start].vertices[k];
        let in_wedge = |t: usize| -> Option<bool> {
            let local = self.triangles()[t].local_index(vertex)?;
            let c = self.plan_corners(t);
            let apex = c[local];
            let next = c[(local + 1) % 3].sub(apex);
            let prev = c[(local + 2) % 3].sub(apex);
            Some(cross(next, dir) >= 0.0 && cross(dir, prev) >= 0.0)
        };
        if include_start && in_wedge(start) == Some(true) {
            return Ok(Some(start));
        }
        let limit = self.walk_limit();
        for counter_clockwise in [true, false] {
            let mut t = start;
            loop {
                let Some(local) = self.triangles()[t].local_index(vertex) else {
                    break;
                };
                let edge = if counter_clockwise {
                    (local + 2) % 3
                } else {
                    local
                };
                let Some(n) = self.triangles()[t].neighbors[edge] else {
                    break;
                };
                if n == start || n >= self.triangle_count() {
                    break;
                }
                *visits += 1;
                if *visits > limit {
                    return Err(SectionError::VisitLimitExceeded(limit));
                }
                match in_wedge(n) {
                    Some(true) => return Ok(Some(n)),
                    Some(false) => t = n,
                    None => break,
                }
            }
        }
        Ok(None)
    }
}

/// Whether the segment comes back onto the mesh after leaving it at `t`.
fn reenters(crossings: &[BoundaryCrossing], t: f64, eps: f64) -> bool {
    crossings.iter().any(|c| c.entering && c.t > t + eps)
}

/// Parameter along `p`-`q` where the line through `a` with direction `dir`
/// crosses it. `None` when they are parallel.
fn edge_parameter(p: Point, q: Point, a: Point, dir: Point) -> Option<f64> {
    let rate = cross(q.sub(p), dir);
    (rate != 0.0).then(|| cross(a.sub(p), dir) / rate)
}

/// Appends `n` keeping distances strictly increasing. A node that does not
/// advance replaces the previous one unless that is the first node.
fn push_increasing(out: &mut Vec<CrossSectionNode>, n: CrossSectionNode, tolerance: f64) {
    match out.last() {
        Some(last) if n.distance - last.distance <= tolerance => {
            if out.len() > 1 {
                out.pop();
                out.push(n);
            }
        }
        _ => out.push(n),
    }
}

fn rebase(nodes: &mut [CrossSectionNode]) {
    if let Some(first) = nodes.first().map(|n| n.distance) {
        for n in nodes.iter_mut() {
            n.distance -= first;
        }
    }
}

fn same_surface(a: &CrossSectionNode, b: &CrossSectionNode) -> bool {
    a.layer == b.layer && a.flags == b.flags
}

fn collinear(
    a: &CrossSectionNode,
    b: &CrossSectionNode,
    c: &CrossSectionNode,
    tolerance: f64,
) -> bool {
    let (d1, z1) = (b.distance - a.distance, b.position.z - a.position.z);
    let (d2, z2) = (c.distance - a.distance, c.position.z - a.position.z);
    // Height of `b` above or below the chord `a`-`c`.
    (d1 * z2 - z1 * d2).abs() / d2 <= tolerance
}

/// Enforces strictly increasing distances and, optionally, merges collinear
/// crossings. The first and last nodes are kept.
fn tidy(nodes: Vec<CrossSectionNode>, options: &SectionOptions) -> Vec<CrossSectionNode> {
    let mut increasing = Vec::with_capacity(nodes.len());
    for n in nodes {
        push_increasing(&mut increasing, n, options.tolerance);
    }
    if !options.merge_collinear || increasing.len() < 3 {
        return increasing;
    }
    let mut out: Vec<CrossSectionNode> = Vec::with_capacity(increasing.len());
    out.push(increasing[0]);
    for w in increasing.windows(2).skip(1) {
        let (cur, next) = (&w[0], &w[1]);
        let prev = out[out.len() - 1];
        if collinear(&prev, cur, next, options.tolerance) && same_surface(cur, next) {
            continue;
        }
        out.push(*cur);
    }
    out.extend(increasing.last().copied());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtm::fixtures::{grid, l_shape, unit_square};

    fn assert_increasing(nodes: &[CrossSectionNode]) {
        assert!(nodes.windows(2).all(|w| w[1].distance > w[0].distance));
    }

    #[test]
    fn clipped_section_across_unit_square() {
        let tin = unit_square();
        let nodes = tin
            .section(Point::new(-1.0, 0.5), Point::new(2.0, 0.5))
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert!((nodes[0].position.x).abs() < 1e-12);
        assert!((nodes[0].position.y - 0.5).abs() < 1e-12);
        assert_eq!(nodes[0].position.z, 0.0);
        assert!((nodes[1].position.x - 1.0).abs() < 1e-12);
        assert!((nodes[1].position.y - 0.5).abs() < 1e-12);
        assert_eq!(nodes[0].distance, 0.0);
        assert!((nodes[1].distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unmerged_section_keeps_edge_crossings() {
        let tin = unit_square();
        let options = SectionOptions {
            merge_collinear: false,
            ..SectionOptions::default()
        };
        let nodes = tin
            .section_with(Point::new(-1.0, 0.5), Point::new(2.0, 0.5), &options)
            .unwrap();
        assert_eq!(nodes.len(), 3);
        assert!((nodes[1].position.x - 0.5).abs() < 1e-12);
        assert_increasing(&nodes);
    }

    #[test]
    fn section_on_sloped_grid_follows_surface() {
        let tin = grid(4, 1.0, |x, y| 2.0 * x + y);
        let nodes = tin
            .section(Point::new(0.2, 0.3), Point::new(3.7, 3.1))
            .unwrap();
        assert_increasing(&nodes);
        for n in &nodes {
            let expected = 2.0 * n.position.x + n.position.y;
            assert!((n.position.z - expected).abs() < 1e-9);
        }
        let first = nodes.first().unwrap().position;
        let last = nodes.last().unwrap().position;
        assert!((first.x - 0.2).abs() < 1e-12 && (first.y - 0.3).abs() < 1e-12);
        assert!((last.x - 3.7).abs() < 1e-12 && (last.y - 3.1).abs() < 1e-12);
    }

    #[test]
    fn section_through_vertices_uses_fan() {
        let tin = grid(3, 1.0, |x, y| x + 2.0 * y);
        let options = SectionOptions {
            merge_collinear: false,
            ..SectionOptions::default()
        };
        // The anti-diagonal passes through interior vertices (1, 2) and
        // (2, 1) and cuts each cell diagonal at its midpoint.
        let nodes = tin
            .section_with(Point::new(0.0, 3.0), Point::new(3.0, 0.0), &options)
            .unwrap();
        assert_increasing(&nodes);
        assert_eq!(nodes.len(), 7);
        for n in &nodes {
            assert!((n.position.z - (n.position.x + 2.0 * n.position.y)).abs() < 1e-9);
        }
        assert!((nodes[2].position.x - 1.0).abs() < 1e-9);
        assert!((nodes[2].position.y - 2.0).abs() < 1e-9);
        let total = nodes.last().unwrap().distance;
        assert!((total - 18f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn section_along_shared_diagonal() {
        let tin = grid(3, 1.0, |_, _| 1.0);
        let nodes = tin
            .section(Point::new(0.0, 0.0), Point::new(3.0, 3.0))
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert!((nodes[1].distance - 18f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn collinear_merge_respects_layers() {
        let mut tin = unit_square();
        let mut triangles = tin.triangles().to_vec();
        triangles[1].layer = 7;
        tin = Tin::new(tin.vertices().to_vec(), triangles);
        let nodes = tin
            .section(Point::new(-1.0, 0.5), Point::new(2.0, 0.5))
            .unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1].layer, 7);
        assert_eq!(nodes[2].layer, 0);
    }

    #[test]
    fn inactive_faces_are_still_sectioned() {
        let mut tin = unit_square();
        tin.clear_flag(0, TriangleFlags::ACTIVE).unwrap();
        let nodes = tin
            .section(Point::new(0.1, 0.5), Point::new(0.9, 0.5))
            .unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(!nodes[2].flags.contains(TriangleFlags::ACTIVE));
    }

    #[test]
    fn segment_errors() {
        let tin = unit_square();
        let p = Point::new(0.5, 0.5);
        assert_eq!(tin.section(p, p), Err(SectionError::DegenerateSegment));
        assert_eq!(
            tin.section(Point::new(5.0, 5.0), Point::new(6.0, 5.0)),
            Err(SectionError::NeverEntersMesh)
        );
        // Inside the bounding box of an L-shaped mesh but not over it.
        let notched = Tin::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 4], [0, 4, 3]],
        )
        .unwrap();
        assert_eq!(
            notched.section(Point::new(1.6, 1.9), Point::new(1.9, 1.6)),
            Err(SectionError::NeverEntersMesh)
        );
    }

    #[test]
    fn section_leaving_and_reentering_fails() {
        // Two squares with a gap between x = 1 and x = 2.
        let tin = Tin::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(3.0, 1.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]],
        )
        .unwrap();
        let err = tin
            .section(Point::new(0.5, 0.5), Point::new(3.5, 0.5))
            .unwrap_err();
        assert!(matches!(err, SectionError::LeftMesh { .. }));
    }

    #[test]
    fn oblique_exit_is_clipped_on_the_line() {
        let tin = unit_square();
        let nodes = tin
            .section(Point::new(0.5, 0.5), Point::new(2.0, 1.5))
            .unwrap();
        assert_eq!(nodes.len(), 2);
        let last = nodes[1];
        assert!((last.position.x - 1.0).abs() < 1e-12);
        assert!((last.position.y - 5.0 / 6.0).abs() < 1e-12);
        assert!((last.distance - 3.25f64.sqrt() / 3.0).abs() < 1e-12);
    }

    #[test]
    fn oblique_entry_is_clipped_on_the_line() {
        let tin = unit_square();
        // The line crosses the extension of the bottom edge before it
        // reaches the left edge.
        let nodes = tin
            .section(Point::new(-1.0, -0.5), Point::new(0.5, 0.5))
            .unwrap();
        let first = nodes[0].position;
        assert!(first.x.abs() < 1e-12);
        assert!((first.y - 1.0 / 6.0).abs() < 1e-12);
        let last = nodes.last().unwrap();
        assert!((last.position.x - 0.5).abs() < 1e-12);
        assert!((last.distance - 3.25f64.sqrt() / 3.0).abs() < 1e-12);
    }

    #[test]
    fn grazing_a_corner_never_enters() {
        let tin = unit_square();
        assert_eq!(
            tin.section(Point::new(0.0, 2.0), Point::new(2.0, 0.0)),
            Err(SectionError::NeverEntersMesh)
        );
    }

    #[test]
    fn concave_mesh_sections_across_the_notch_corner() {
        let tin = l_shape();
        let (a, b) = (Point::new(1.8, 0.2), Point::new(0.2, 1.2));
        let length = 3.56f64.sqrt();
        for (from, to) in [(a, b), (b, a)] {
            let nodes = tin.section(from, to).unwrap();
            let first = nodes[0].position;
            let last = nodes.last().unwrap();
            assert!((first.x - from.x).abs() < 1e-12 && (first.y - from.y).abs() < 1e-12);
            assert!((last.position.x - to.x).abs() < 1e-12);
            assert!((last.position.y - to.y).abs() < 1e-12);
            assert!((last.distance - length).abs() < 1e-12);
        }
    }

    #[test]
    fn concave_mesh_clips_at_the_notch() {
        let tin = l_shape();
        let nodes = tin
            .section(Point::new(1.5, 0.5), Point::new(1.5, 1.8))
            .unwrap();
        let last = nodes.last().unwrap();
        assert!((last.position.y - 1.0).abs() < 1e-12);
        assert!((last.distance - 0.5).abs() < 1e-12);

        let err = tin
            .section(Point::new(1.8, 0.8), Point::new(0.8, 1.8))
            .unwrap_err();
        assert!(matches!(err, SectionError::LeftMesh { .. }));
    }

    #[test]
    fn collinear_tolerance_is_a_height() {
        let at = |distance: f64, z: f64| CrossSectionNode {
            position: Point3::new(distance, 0.0, z),
            distance,
            triangle: 0,
            layer: 0,
            flags: TriangleFlags::ACTIVE,
        };
        let (a, c) = (at(0.0, 0.0), at(0.01, 0.0));
        assert!(collinear(&a, &at(0.005, 1e-10), &c, 1e-9));
        assert!(!collinear(&a, &at(0.005, 1e-8), &c, 1e-9));
        let (a, c) = (at(0.0, 0.0), at(100.0, 100.0));
        assert!(collinear(&a, &at(50.0, 50.0 + 5e-10), &c, 1e-9));
        assert!(!collinear(&a, &at(50.0, 50.0 + 1e-7), &c, 1e-9));
    }

    #[test]
    fn self_linked_triangle_is_bounded() {
        let tin = Tin::from_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let mut triangles = tin.triangles().to_vec();
        // The hypotenuse leads back into the same face.
        triangles[0].neighbors[1] = Some(0);
        triangles[0].back[1] = 0;
        let tin = Tin::new(tin.vertices().to_vec(), triangles);
        let err = tin
            .section(Point::new(0.1, 0.1), Point::new(0.9, 0.9))
            .unwrap_err();
        assert!(matches!(
            err,
            SectionError::VisitLimitExceeded(_)
                | SectionError::Locate(LocateError::WalkLimitExceeded(_))
        ));
    }

    #[test]
    fn polyline_distances_are_cumulative() {
        let tin = grid(4, 1.0, |x, _| x);
        let path = [
            Point::new(0.5, 0.5),
            Point::new(3.5, 0.5),
            Point::new(3.5, 3.5),
        ];
        let nodes = tin.section_polyline(&path).unwrap();
        assert_increasing(&nodes);
        assert_eq!(nodes[0].distance, 0.0);
        let last = nodes.last().unwrap();
        assert!((last.distance - 6.0).abs() < 1e-9);
        assert!((last.position.z - 3.5).abs() < 1e-9);
        let corner = nodes
            .iter()
            .filter(|n| (n.position.x - 3.5).abs() < 1e-9 && (n.position.y - 0.5).abs() < 1e-9)
            .count();
        assert_eq!(corner, 1);
    }

    #[test]
    fn polyline_needs_two_points() {
        let tin = unit_square();
        assert_eq!(
            tin.section_polyline(&[Point::new(0.5, 0.5)]),
            Err(SectionError::TooFewPoints(1))
        );
    }
}

//! Triangulated Irregular Network store with explicit neighbour links.
//!
//! Triangles live in a flat array and refer to each other by index. Edge `i`
//! of a triangle joins vertex `i` and vertex `(i + 1) % 3`, and
//! `neighbors[i]` is the triangle across that edge (`None` on the mesh
//! boundary). `back[i]` records which edge of the neighbour points back.
//!
//! Shape (vertices, triangles, adjacency) is fixed once built. Only triangle
//! flags and a bulk translation may change it afterwards, both through
//! `&mut self`, so a mesh shared between threads is read-only.

mod locate;
mod normals;

pub use normals::Progress;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use bitflags::bitflags;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{LocateError, MeshError};
use crate::geometry::{barycentric, signed_area, Extents, Point, Point3};

bitflags! {
    /// Per-triangle state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TriangleFlags: u8 {
        /// Triangle takes part in queries.
        const ACTIVE = 0b0000_0001;
        /// Triangle is hidden from display.
        const HIDDEN = 0b0000_0010;
        /// Triangle may not be edited.
        const LOCKED = 0b0000_0100;
    }
}

bitflags! {
    /// Per-edge markers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EdgeFlags: u8 {
        const BREAKLINE = 0b0000_0001;
        const BOUNDARY = 0b0000_0010;
        const INTERNAL = 0b0000_0100;
        const CATCH = 0b0000_1000;
        const STREAM = 0b0001_0000;
    }
}

fn default_flags() -> TriangleFlags {
    TriangleFlags::ACTIVE
}

/// A TIN face with its adjacency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertex indices, counter-clockwise in plan.
    pub vertices: [usize; 3],
    /// Triangle across each edge, `None` on the boundary.
    #[serde(default)]
    pub neighbors: [Option<usize>; 3],
    /// Edge index on the neighbour that links back to this triangle.
    #[serde(default)]
    pub back: [u8; 3],
    /// Layer / classification code.
    #[serde(default)]
    pub layer: u8,
    #[serde(default)]
    pub edge_flags: [EdgeFlags; 3],
    #[serde(default = "default_flags")]
    pub flags: TriangleFlags,
}

impl Triangle {
    /// Creates an active triangle with no neighbours.
    pub fn new(vertices: [usize; 3]) -> Self {
        Self {
            vertices,
            neighbors: [None; 3],
            back: [0; 3],
            layer: 0,
            edge_flags: [EdgeFlags::empty(); 3],
            flags: TriangleFlags::ACTIVE,
        }
    }

    /// Vertex indices at both ends of edge `edge`.
    pub fn edge(&self, edge: usize) -> (usize, usize) {
        (self.vertices[edge], self.vertices[(edge + 1) % 3])
    }

    /// Local position (0..3) of a global vertex index.
    pub fn local_index(&self, vertex: usize) -> Option<usize> {
        self.vertices.iter().position(|&v| v == vertex)
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(TriangleFlags::ACTIVE)
    }

    /// Hidden or locked.
    pub fn is_frozen(&self) -> bool {
        self.flags
            .intersects(TriangleFlags::HIDDEN | TriangleFlags::LOCKED)
    }
}

/// Triangulated Irregular Network with explicit adjacency.
#[derive(Debug, Serialize, Deserialize)]
pub struct Tin {
    vertices: Vec<Point3>,
    triangles: Vec<Triangle>,
    #[serde(skip)]
    seed: AtomicUsize,
    #[serde(skip)]
    extents: OnceLock<Extents>,
    #[serde(skip)]
    active_extents: OnceLock<Extents>,
    #[serde(skip)]
    vertex_normals: OnceLock<Vec<Vector3<f64>>>,
}

impl Clone for Tin {
    fn clone(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            triangles: self.triangles.clone(),
            seed: AtomicUsize::new(self.seed()),
            extents: self.extents.clone(),
            active_extents: self.active_extents.clone(),
            vertex_normals: self.vertex_normals.clone(),
        }
    }
}

impl Default for Tin {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl Tin {
    /// Wraps already linked vertex and triangle arrays. No validation is
    /// performed; see [`Tin::validate`].
    pub fn new(vertices: Vec<Point3>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
            seed: AtomicUsize::new(0),
            extents: OnceLock::new(),
            active_extents: OnceLock::new(),
            vertex_normals: OnceLock::new(),
        }
    }

    /// Builds a TIN from an indexed face list, linking neighbours across
    /// shared edges. Faces are reordered counter-clockwise in plan. Unshared
    /// edges are flagged [`EdgeFlags::BOUNDARY`].
    pub fn from_faces(vertices: Vec<Point3>, faces: Vec<[usize; 3]>) -> Result<Self, MeshError> {
        let mut triangles = Vec::with_capacity(faces.len());
        for (t, [a, b, c]) in faces.into_iter().enumerate() {
            for v in [a, b, c] {
                if v >= vertices.len() {
                    return Err(MeshError::VertexOutOfRange {
                        triangle: t,
                        vertex: v,
                    });
                }
            }
            if a == b || b == c || a == c {
                return Err(MeshError::DegenerateFace(t));
            }
            let ccw = signed_area(vertices[a].xy(), vertices[b].xy(), vertices[c].xy()) >= 0.0;
            triangles.push(Triangle::new(if ccw { [a, b, c] } else { [a, c, b] }));
        }

        // Second use of an edge links the pair; a third is non-manifold.
        let mut open: HashMap<(usize, usize), Option<(usize, usize)>> = HashMap::new();
        for t in 0..triangles.len() {
            for e in 0..3 {
                let (a, b) = triangles[t].edge(e);
                let key = (a.min(b), a.max(b));
                match open.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(Some((t, e)));
                    }
                    Entry::Occupied(mut slot) => match slot.get_mut().take() {
                        Some((n, ne)) => {
                            triangles[t].neighbors[e] = Some(n);
                            triangles[t].back[e] = ne as u8;
                            triangles[t].edge_flags[e] |= EdgeFlags::INTERNAL;
                            triangles[n].neighbors[ne] = Some(t);
                            triangles[n].back[ne] = e as u8;
                            triangles[n].edge_flags[ne] |= EdgeFlags::INTERNAL;
                        }
                        None => return Err(MeshError::NonManifoldEdge { a: key.0, b: key.1 }),
                    },
                }
            }
        }
        for tri in &mut triangles {
            for e in 0..3 {
                if tri.neighbors[e].is_none() {
                    tri.edge_flags[e] |= EdgeFlags::BOUNDARY;
                }
            }
        }
        Ok(Self::new(vertices, triangles))
    }

    /// Checks index ranges and adjacency symmetry.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (t, tri) in self.triangles.iter().enumerate() {
            for &v in &tri.vertices {
                if v >= self.vertices.len() {
                    return Err(MeshError::VertexOutOfRange {
                        triangle: t,
                        vertex: v,
                    });
                }
            }
            for e in 0..3 {
                let Some(n) = tri.neighbors[e] else {
                    continue;
                };
                let Some(other) = self.triangles.get(n) else {
                    return Err(MeshError::NeighborOutOfRange {
                        triangle: t,
                        edge: e,
                        neighbor: n,
                    });
                };
                let b = tri.back[e] as usize;
                if b > 2 {
                    return Err(MeshError::BackEdgeOutOfRange {
                        triangle: t,
                        edge: e,
                    });
                }
                if other.neighbors[b] != Some(t) || other.back[b] as usize != e {
                    return Err(MeshError::AsymmetricAdjacency {
                        triangle: t,
                        edge: e,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex(&self, index: usize) -> Option<Point3> {
        self.vertices.get(index).copied()
    }

    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Upper bound on the triangles any single walk may visit.
    pub fn walk_limit(&self) -> usize {
        self.triangles.len() + 1
    }

    /// Triangle the next unhinted location walk starts from.
    pub fn seed(&self) -> usize {
        self.seed.load(Ordering::Relaxed)
    }

    pub(crate) fn remember_seed(&self, triangle: usize) {
        self.seed.store(triangle, Ordering::Relaxed);
    }

    /// Bounding box over every triangle's vertices. Invalid for an empty mesh.
    pub fn extents(&self) -> Extents {
        *self.extents.get_or_init(|| self.sweep_extents(false))
    }

    /// Bounding box over the vertices of active triangles only.
    pub fn active_extents(&self) -> Extents {
        *self.active_extents.get_or_init(|| self.sweep_extents(true))
    }

    fn sweep_extents(&self, active_only: bool) -> Extents {
        let mut ext = Extents::INVALID;
        for tri in self
            .triangles
            .iter()
            .filter(|t| !active_only || t.is_active())
        {
            for &v in &tri.vertices {
                if let Some(p) = self.vertices.get(v) {
                    ext.include(*p);
                }
            }
        }
        ext
    }

    /// Shifts every vertex and drops the cached extents.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        for v in &mut self.vertices {
            v.x += dx;
            v.y += dy;
            v.z += dz;
        }
        self.extents.take();
        self.active_extents.take();
        log::debug!("translated {} vertices by ({dx}, {dy}, {dz})", self.vertices.len());
    }

    /// Sets `flag` on triangle `index`.
    pub fn set_flag(&mut self, index: usize, flag: TriangleFlags) -> Result<(), MeshError> {
        self.update_flags(index, flag, |flags| flags.insert(flag))
    }

    /// Clears `flag` on triangle `index`.
    pub fn clear_flag(&mut self, index: usize, flag: TriangleFlags) -> Result<(), MeshError> {
        self.update_flags(index, flag, |flags| flags.remove(flag))
    }

    /// Toggles `flag` on triangle `index`.
    pub fn toggle_flag(&mut self, index: usize, flag: TriangleFlags) -> Result<(), MeshError> {
        self.update_flags(index, flag, |flags| flags.toggle(flag))
    }

    fn update_flags(
        &mut self,
        index: usize,
        flag: TriangleFlags,
        apply: impl FnOnce(&mut TriangleFlags),
    ) -> Result<(), MeshError> {
        let tri = self
            .triangles
            .get_mut(index)
            .ok_or(MeshError::TriangleOutOfRange(index))?;
        apply(&mut tri.flags);
        if flag.contains(TriangleFlags::ACTIVE) {
            self.active_extents.take();
            self.vertex_normals.take();
        }
        Ok(())
    }

    /// Returns `true` if triangle `index` is hidden or locked.
    pub fn is_frozen(&self, index: usize) -> bool {
        self.triangles.get(index).is_some_and(Triangle::is_frozen)
    }

    /// Vertices of triangle `index`. Panics on an out-of-range index, like
    /// slice indexing.
    pub(crate) fn corners(&self, index: usize) -> [Point3; 3] {
        self.triangles[index].vertices.map(|v| self.vertices[v])
    }

    /// Plan projection of [`Tin::corners`].
    pub(crate) fn plan_corners(&self, index: usize) -> [Point; 3] {
        self.corners(index).map(|p| p.xy())
    }

    /// Elevation of the plane of triangle `index` at `p`.
    pub(crate) fn interpolate_z(&self, index: usize, p: Point) -> Option<f64> {
        let [a, b, c] = self.corners(index);
        let (u, v, w) = barycentric(p, a, b, c)?;
        Some(u * a.z + v * b.z + w * c.z)
    }

    /// Returns the slope in degrees for each triangle in the TIN.
    pub fn triangle_slopes(&self) -> Vec<f64> {
        (0..self.triangles.len())
            .map(|t| {
                let [a, b, c] = self.corners(t);
                triangle_slope_deg(a, b, c)
            })
            .collect()
    }

    /// Returns the slope in degrees of the active triangle under (x, y).
    pub fn slope_at(&self, x: f64, y: f64) -> Result<f64, LocateError> {
        let t = self.locate_xy(x, y)?;
        let [a, b, c] = self.corners(t);
        Ok(triangle_slope_deg(a, b, c))
    }
}

fn edge_slope(p: Point3, q: Point3) -> f64 {
    let dx = p.x - q.x;
    let dy = p.y - q.y;
    let horiz = (dx * dx + dy * dy).sqrt();
    if horiz <= f64::EPSILON {
        90.0
    } else {
        ((p.z - q.z).abs() / horiz).atan().to_degrees()
    }
}

fn triangle_slope_deg(a: Point3, b: Point3, c: Point3) -> f64 {
    edge_slope(a, b).max(edge_slope(a, c)).max(edge_slope(b, c))
}

//! Face and vertex normals.

use std::collections::{HashSet, VecDeque};

use nalgebra::Vector3;

use super::Tin;

/// Progress sink: receives a fraction in `[0, 1]` and a phase label.
pub type Progress<'a> = &'a mut dyn FnMut(f64, &str);

const FACE_PHASE_END: f64 = 0.1;

fn report(progress: &mut Option<Progress<'_>>, fraction: f64, label: &str) {
    if let Some(cb) = progress.as_mut() {
        cb(fraction, label);
    }
}

fn to_vector(p: crate::geometry::Point3) -> Vector3<f64> {
    Vector3::new(p.x, p.y, p.z)
}

impl Tin {
    /// Unit normal of triangle `index`, pointing up for a counter-clockwise
    /// face. Zero for a degenerate face, `None` for a missing one.
    pub fn face_normal(&self, index: usize) -> Option<Vector3<f64>> {
        let tri = self.triangles.get(index)?;
        let [a, b, c] = tri.vertices.map(|v| self.vertices.get(v).copied());
        let (a, b, c) = (to_vector(a?), to_vector(b?), to_vector(c?));
        let n = (b - a).cross(&(c - a));
        Some(n.try_normalize(f64::MIN_POSITIVE).unwrap_or_else(Vector3::zeros))
    }

    /// Normals of every triangle, in triangle order.
    pub fn face_normals(&self) -> Vec<Vector3<f64>> {
        (0..self.triangles.len())
            .map(|t| self.face_normal(t).unwrap_or_else(Vector3::zeros))
            .collect()
    }

    /// Averages the normals of the active faces around each vertex.
    ///
    /// The faces around a vertex are gathered by a breadth-first walk over
    /// neighbour links, restricted to triangles touching the vertex
    /// position. Vertices without an active face get a zero vector.
    pub fn compute_vertex_normals(&self, mut progress: Option<Progress<'_>>) -> Vec<Vector3<f64>> {
        let count = self.triangles.len();
        let step = (count / 50).max(1);

        let mut faces = Vec::with_capacity(count);
        report(&mut progress, 0.0, "face normals");
        for t in 0..count {
            faces.push(self.face_normal(t).unwrap_or_else(Vector3::zeros));
            if t % step == 0 {
                report(&mut progress, FACE_PHASE_END * t as f64 / count as f64, "face normals");
            }
        }
        report(&mut progress, FACE_PHASE_END, "face normals");

        let mut normals = vec![Vector3::zeros(); self.vertices.len()];
        let mut done = vec![false; self.vertices.len()];
        for t in 0..count {
            for v in self.triangles[t].vertices {
                if v >= done.len() || done[v] {
                    continue;
                }
                done[v] = true;
                normals[v] = self.fan_normal(t, v, &faces);
            }
            if t % step == 0 {
                let f = FACE_PHASE_END + (1.0 - FACE_PHASE_END) * t as f64 / count as f64;
                report(&mut progress, f, "vertex normals");
            }
        }
        report(&mut progress, 1.0, "vertex normals");
        log::debug!("computed normals for {} vertices", normals.len());
        normals
    }

    /// Cached vertex normals, computed on first use.
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        self.vertex_normals
            .get_or_init(|| self.compute_vertex_normals(None))
    }

    fn fan_normal(&self, start: usize, vertex: usize, faces: &[Vector3<f64>]) -> Vector3<f64> {
        let position = self.vertices[vertex];
        let touches = |t: usize| {
            self.triangles[t]
                .vertices
                .iter()
                .any(|&v| self.vertices.get(v) == Some(&position))
        };

        let mut sum = Vector3::zeros();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(t) = queue.pop_front() {
            if self.triangles[t].is_active() {
                sum += faces[t];
            }
            for n in self.triangles[t].neighbors.into_iter().flatten() {
                if n < self.triangles.len() && touches(n) && visited.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        sum.try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros)
    }
}

#![allow(dead_code)]

use survey_tin::dtm::Tin;
use survey_tin::geometry::Point3;

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Regular `n` x `n` grid of cells with spacing `step`, elevations from
/// `z(x, y)`.
pub fn grid(n: usize, step: f64, z: impl Fn(f64, f64) -> f64) -> Tin {
    let mut vertices = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64 * step, j as f64 * step);
            vertices.push(Point3::new(x, y, z(x, y)));
        }
    }
    let idx = |i: usize, j: usize| j * (n + 1) + i;
    let mut faces = Vec::new();
    for j in 0..n {
        for i in 0..n {
            faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            faces.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    Tin::from_faces(vertices, faces).unwrap()
}

/// Flat `2 * step` square with the top-right cell missing.
pub fn l_shape(step: f64, z: f64) -> Tin {
    let mut vertices = Vec::new();
    for j in 0..3 {
        for i in 0..3 {
            vertices.push(Point3::new(i as f64 * step, j as f64 * step, z));
        }
    }
    vertices.pop();
    let faces = vec![
        [0, 1, 4],
        [0, 4, 3],
        [1, 2, 5],
        [1, 5, 4],
        [3, 4, 7],
        [3, 7, 6],
    ];
    Tin::from_faces(vertices, faces).unwrap()
}

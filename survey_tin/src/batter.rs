//! Batter (cut/fill slope) lines projected from a design polyline onto a
//! ground [`Tin`].
//!
//! For each design vertex a probe section is cut perpendicular to the line.
//! A slope is then walked out along the probe, descending at the fill grade
//! while it is above the ground and climbing at the cut grade while below,
//! until it meets the terrain.

use serde::{Deserialize, Serialize};

use crate::dtm::Tin;
use crate::error::BatterError;
use crate::geometry::{distance, unit, Point, Point3};
use crate::section::CrossSectionNode;

/// Height difference treated as touching the ground.
const GROUND_TOLERANCE: f64 = 1e-9;

/// Side of the design line the batter is projected to, looking along the
/// line's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// What to do when one vertex's batter point cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexFailurePolicy {
    /// Fail the whole call.
    #[default]
    Abort,
    /// Leave the vertex out and carry on.
    Skip,
}

/// Parameters for [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatterConfig {
    pub side: Side,
    /// Horizontal reach of each ground probe.
    pub max_width: f64,
    /// Rise per unit run used below the ground. Sign is ignored.
    pub cut_grade: f64,
    /// Fall per unit run used above the ground. Sign is ignored.
    pub fill_grade: f64,
    /// Follow the terrain between batter points.
    pub drape: bool,
    /// Treat the polyline as a closed ring.
    pub close: bool,
    pub cap_start: bool,
    pub cap_end: bool,
    pub on_vertex_failure: VertexFailurePolicy,
}

impl Default for BatterConfig {
    fn default() -> Self {
        Self {
            side: Side::Left,
            max_width: 50.0,
            cut_grade: 0.5,
            fill_grade: -0.5,
            drape: false,
            close: false,
            cap_start: false,
            cap_end: false,
            on_vertex_failure: VertexFailurePolicy::Abort,
        }
    }
}

impl BatterConfig {
    pub fn new(side: Side, max_width: f64, cut_grade: f64, fill_grade: f64) -> Self {
        Self {
            side,
            max_width,
            cut_grade,
            fill_grade,
            ..Self::default()
        }
    }

    fn cut(&self) -> f64 {
        self.cut_grade.abs()
    }

    fn fill(&self) -> f64 {
        -self.fill_grade.abs()
    }
}

impl Tin {
    /// Projects batter slopes from `polyline` onto this surface. See
    /// [`generate`].
    pub fn batter(
        &self,
        polyline: &[Point3],
        config: &BatterConfig,
    ) -> Result<Vec<Point3>, BatterError> {
        generate(polyline, config, self)
    }
}

/// Generates the batter line for a design polyline.
pub fn generate(
    polyline: &[Point3],
    config: &BatterConfig,
    tin: &Tin,
) -> Result<Vec<Point3>, BatterError> {
    if polyline.len() < 2 {
        return Err(BatterError::TooFewPoints(polyline.len()));
    }
    if !(config.max_width.is_finite() && config.max_width > 0.0) {
        return Err(BatterError::InvalidWidth(config.max_width));
    }

    let mut design = polyline;
    if config.close && design.len() > 2 {
        let (first, last) = (design[0], design[design.len() - 1]);
        if distance(first.xy(), last.xy()) <= GROUND_TOLERANCE {
            design = &design[..design.len() - 1];
        }
    }

    let perps = perpendiculars(design, config.side, config.close)?;
    if perps.len() != design.len() {
        return Err(BatterError::PerpendicularCountMismatch {
            expected: design.len(),
            actual: perps.len(),
        });
    }

    let mut points = Vec::with_capacity(design.len() + 2);
    let mut first_error = None;
    for (vertex, (&origin, &perp)) in design.iter().zip(&perps).enumerate() {
        match batter_point(tin, vertex, origin, perp, config) {
            Ok(p) => points.push(p),
            Err(e) if config.on_vertex_failure == VertexFailurePolicy::Skip => {
                log::warn!("skipping batter vertex {vertex}: {e}");
                first_error.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }
    if points.is_empty() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }

    if config.close {
        if let Some(&first) = points.first() {
            points.push(first);
        }
    }

    if config.drape && points.len() >= 2 {
        let plan: Vec<Point> = points.iter().map(Point3::xy).collect();
        let nodes = tin
            .section_polyline(&plan)
            .map_err(BatterError::DrapeFailed)?;
        points = nodes.into_iter().map(|n| n.position).collect();
    }

    if !config.close {
        if config.cap_start {
            points.insert(0, polyline[0]);
        }
        if config.cap_end {
            points.push(polyline[polyline.len() - 1]);
        }
    }

    log::debug!(
        "batter line with {} points from {} design vertices",
        points.len(),
        design.len()
    );
    Ok(points)
}

fn side_normal(a: Point, b: Point, side: Side) -> Option<Point> {
    let d = unit(b.sub(a))?;
    Some(match side {
        Side::Left => Point::new(-d.y, d.x),
        Side::Right => Point::new(d.y, -d.x),
    })
}

/// Unit direction of the probe at each vertex: the bisector of the side
/// normals of the segments meeting there.
fn perpendiculars(design: &[Point3], side: Side, closed: bool) -> Result<Vec<Point>, BatterError> {
    let n = design.len();
    let plan: Vec<Point> = design.iter().map(Point3::xy).collect();
    let segment = |i: usize| side_normal(plan[i], plan[(i + 1) % n], side);

    let mut out = Vec::with_capacity(n);
    for vertex in 0..n {
        let failed = BatterError::PerpendicularGenerationFailed { vertex };
        let (before, after) = if closed {
            (Some((vertex + n - 1) % n), Some(vertex))
        } else {
            (vertex.checked_sub(1), (vertex + 1 < n).then_some(vertex))
        };
        let mut sum = Point::new(0.0, 0.0);
        for s in [before, after].into_iter().flatten() {
            let normal = segment(s).ok_or(failed.clone())?;
            sum = sum.offset(normal, 1.0);
        }
        out.push(unit(sum).ok_or(failed)?);
    }
    Ok(out)
}

/// Offset and height where the slope from `start_z` meets the ground
/// profile `samples` of (offset, height) pairs.
fn grade_walk(samples: &[(f64, f64)], start_z: f64, cut: f64, fill: f64) -> Option<(f64, f64)> {
    let grade_for = |diff: f64| if diff > 0.0 { fill } else { cut };

    let (h0, z0) = *samples.first()?;
    // The probe may only reach the ground some way out.
    let mut height = start_z + grade_for(start_z - z0) * h0;
    if (start_z - z0) * (height - z0) <= 0.0 && h0 > 0.0 {
        return Some((h0, z0));
    }

    for pair in samples.windows(2) {
        let ((ha, za), (hb, zb)) = (pair[0], pair[1]);
        let diff_a = height - za;
        if diff_a.abs() <= GROUND_TOLERANCE {
            return Some((ha, height));
        }
        let run = hb - ha;
        let grade = grade_for(diff_a);
        let next = height + grade * run;
        let diff_b = next - zb;
        if diff_b == 0.0 || diff_a.signum() != diff_b.signum() {
            let slope = (zb - za) / run;
            let x = diff_a / (slope - grade);
            return Some((ha + x, za + slope * x));
        }
        height = next;
    }

    let &(h, z) = samples.last()?;
    ((height - z).abs() <= GROUND_TOLERANCE).then_some((h, z))
}

fn batter_point(
    tin: &Tin,
    vertex: usize,
    origin: Point3,
    perp: Point,
    config: &BatterConfig,
) -> Result<Point3, BatterError> {
    let start = origin.xy();
    let far = start.offset(perp, config.max_width);
    let profile: Vec<CrossSectionNode> = tin
        .section(start, far)
        .map_err(|source| BatterError::PerpendicularSectionFailed { vertex, source })?;
    if profile.len() < 2 {
        return Err(BatterError::BatterPointNotFound { vertex });
    }
    let samples: Vec<(f64, f64)> = profile
        .iter()
        .map(|n| (distance(start, n.position.xy()), n.position.z))
        .collect();
    let (h, z) = grade_walk(&samples, origin.z, config.cut(), config.fill())
        .ok_or(BatterError::BatterPointNotFound { vertex })?;
    let p = start.offset(perp, h);
    log::trace!("batter vertex {vertex} meets ground at offset {h:.3}");
    Ok(Point3::new(p.x, p.y, z))
}

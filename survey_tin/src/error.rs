//! Error types for TIN queries, sections and batter generation.

use thiserror::Error;

/// Structural problems in mesh arrays or flag updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references missing vertex {vertex}")]
    VertexOutOfRange { triangle: usize, vertex: usize },

    /// A face repeats one of its vertex indices.
    #[error("triangle {0} repeats a vertex index")]
    DegenerateFace(usize),

    /// A neighbour link points past the end of the triangle array.
    #[error("triangle {triangle} edge {edge} links to missing triangle {neighbor}")]
    NeighborOutOfRange {
        triangle: usize,
        edge: usize,
        neighbor: usize,
    },

    /// A back-edge index is not 0, 1 or 2.
    #[error("triangle {triangle} edge {edge} has an invalid back edge")]
    BackEdgeOutOfRange { triangle: usize, edge: usize },

    /// The neighbour does not link back through the recorded edge.
    #[error("adjacency of triangle {triangle} edge {edge} is not symmetric")]
    AsymmetricAdjacency { triangle: usize, edge: usize },

    /// More than two faces share the edge `a`-`b`.
    #[error("edge {a}-{b} is shared by more than two faces")]
    NonManifoldEdge { a: usize, b: usize },

    /// Flag update on a triangle that does not exist.
    #[error("triangle {0} is out of range")]
    TriangleOutOfRange(usize),
}

/// Point location failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// The walk left the mesh through a boundary edge.
    #[error("point lies outside the mesh (left triangle {triangle} through edge {edge})")]
    OutsideMesh { triangle: usize, edge: usize },

    /// The walk reached a neighbour index that does not exist.
    #[error("triangle {triangle} edge {edge} links to a missing triangle")]
    InvalidNeighbor { triangle: usize, edge: usize },

    /// The point lies only in inactive triangles.
    #[error("point lies in inactive triangle {0}")]
    Inactive(usize),

    /// The containing triangle has no plan area.
    #[error("triangle {0} is degenerate in plan")]
    DegenerateTriangle(usize),

    /// The walk took more steps than the mesh has triangles.
    #[error("location walk exceeded {0} steps")]
    WalkLimitExceeded(usize),
}

/// Cross-section failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SectionError {
    /// A polyline section needs at least two points.
    #[error("section needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Start and end of the segment coincide.
    #[error("section segment has zero length")]
    DegenerateSegment,

    /// The segment never crosses the area covered by the mesh.
    #[error("section line never enters the mesh")]
    NeverEntersMesh,

    /// Locating an end point failed.
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// The walk hit a boundary before reaching the clipped end.
    #[error("section left the mesh at triangle {triangle} edge {edge}")]
    LeftMesh { triangle: usize, edge: usize },

    /// A triangle along the walk has no exit edge.
    #[error("triangle {0} is degenerate in plan")]
    DegenerateTriangle(usize),

    /// The walk visited more triangles than the mesh holds.
    #[error("section walk exceeded {0} triangle visits")]
    VisitLimitExceeded(usize),
}

/// Batter line generation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatterError {
    /// The design polyline needs at least two points.
    #[error("batter polyline needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// The projection width must be positive.
    #[error("invalid batter width: {0} (must be > 0)")]
    InvalidWidth(f64),

    /// Duplicate points or a reversing polyline at `vertex`.
    #[error("cannot build a perpendicular at vertex {vertex}")]
    PerpendicularGenerationFailed { vertex: usize },

    /// Fewer or more perpendiculars than polyline vertices.
    #[error("expected {expected} perpendiculars, got {actual}")]
    PerpendicularCountMismatch { expected: usize, actual: usize },

    /// The ground probe under a perpendicular failed.
    #[error("ground section at vertex {vertex} failed: {source}")]
    PerpendicularSectionFailed {
        vertex: usize,
        #[source]
        source: SectionError,
    },

    /// The slope never reaches the ground within the probe width.
    #[error("batter at vertex {vertex} does not reach the ground within the batter width")]
    BatterPointNotFound { vertex: usize },

    /// Draping the batter line onto the ground failed.
    #[error("draping the batter line failed: {0}")]
    DrapeFailed(#[source] SectionError),
}

//! Core library for querying, sectioning and battering TIN surfaces.

pub mod batter;
pub mod dtm;
pub mod error;
pub mod geometry;
pub mod io;
pub mod section;

pub use batter::{generate, BatterConfig, Side, VertexFailurePolicy};
pub use dtm::{EdgeFlags, Progress, Tin, Triangle, TriangleFlags};
pub use error::{BatterError, LocateError, MeshError, SectionError};
pub use section::{CrossSectionNode, SectionOptions};

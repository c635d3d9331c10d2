#![doc = include_str!("../README.md")]

// Core data model and the consolidation / densification pipeline.
pub mod camera;
pub mod consolidate;
pub mod densify;
pub mod error;
pub mod transform;
pub mod types;
pub mod view_select;

// Collaborators and persistence.
pub mod angle;
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod fit;
pub mod image;
pub mod records;
pub mod similarity;

// --- High-level re-exports -------------------------------------------------

pub use crate::camera::{CameraPose, Intrinsics, SceneModel};
pub use crate::consolidate::{
    consolidate, Cluster, ClusterMember, ConsolidationParams, LatticeConsolidator, PlanePolicy,
};
pub use crate::densify::{DensifyMode, DensifyOutput, GridDensifier};
pub use crate::error::{LatticeError, Result};
pub use crate::transform::TransformationCode;
pub use crate::types::{GridIndexEntry, LatticeStructure, PointMeasurement, TriangulatedPoint};
pub use crate::view_select::{ViewIdRange, ViewSelector};

pub use crate::config::LatticeParams;
pub use crate::diagnostics::{ConsolidationReport, DensifyReport, RunReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use lattice_consolidation::prelude::*;
/// use nalgebra::{Vector3, Vector4};
///
/// # fn main() {
/// let facade = |s: f64| {
///     LatticeStructure::new(
///         Vector4::new(0.0, 0.0, 1.0, -10.0),
///         [Vector3::new(s, 0.0, 0.0), Vector3::new(0.0, s, 0.0)],
///         Vector3::new(0.0, 0.0, 10.0),
///         4,
///         3,
///     )
/// };
/// let clusters = consolidate(vec![facade(1.0), facade(1.05)]);
/// for member in clusters[0].members() {
///     println!("lattice {} -> {}", member.input_index, member.transform);
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::records::{DirectoryStore, MemoryStore, RecordStore};
    pub use crate::{
        consolidate, CameraPose, DensifyMode, GridDensifier, GridIndexEntry, Intrinsics,
        LatticeConsolidator, LatticeStructure, SceneModel, TransformationCode, ViewIdRange,
        ViewSelector,
    };
}

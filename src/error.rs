//! Error type shared by the fitting, densification and record layers.

use std::fmt;
use std::path::PathBuf;

/// Failures surfaced by the lattice pipeline.
///
/// Consolidation mismatches are not errors: `match_transform` returns `None`.
#[derive(Clone, Debug, PartialEq)]
pub enum LatticeError {
    /// The lattice does not carry exactly two basis vectors.
    InvalidLattice { basis_vectors: usize },
    /// No camera in the allowed range sees the grid cell.
    NoValidView { cell: (i32, i32) },
    /// The descriptor extractor could not describe the pixel.
    DescriptorUnavailable { view_id: i32, reason: String },
    /// A persisted record could not be read or written.
    Io { path: PathBuf, reason: String },
    /// A persisted record was readable but its layout is broken.
    MalformedRecord { record: String, reason: String },
    /// A measurement references a view that has no camera pose.
    UnknownView { view_id: i32 },
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatticeError::InvalidLattice { basis_vectors } => write!(
                f,
                "invalid lattice ({basis_vectors} basis vectors, need exactly 2)"
            ),
            LatticeError::NoValidView { cell } => {
                write!(f, "no valid view for grid cell ({}, {})", cell.0, cell.1)
            }
            LatticeError::DescriptorUnavailable { view_id, reason } => {
                write!(f, "descriptor unavailable in view {view_id}: {reason}")
            }
            LatticeError::Io { path, reason } => {
                write!(f, "I/O failure on {}: {reason}", path.display())
            }
            LatticeError::MalformedRecord { record, reason } => {
                write!(f, "malformed record {record}: {reason}")
            }
            LatticeError::UnknownView { view_id } => {
                write!(f, "no camera pose for view {view_id}")
            }
        }
    }
}

impl std::error::Error for LatticeError {}

pub type Result<T> = std::result::Result<T, LatticeError>;

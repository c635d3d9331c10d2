//! End-to-end lattice fit for one group of 3D points.
//!
//! Plane fitting and basis search are external; this module only wires them
//! together and decides when a fit is abandoned:
//! - fewer than two candidate vectors, or more than `n²/2` for `n` inliers;
//! - a final basis that does not have exactly two vectors.

use crate::error::{LatticeError, Result};
use crate::types::{GridIndexEntry, LatticeStructure, Point3D};

use log::{debug, info};
use nalgebra::{Vector3, Vector4};

/// Result of a robust plane fit over a point group.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneFit {
    /// Global indices of the inliers; no particular order.
    pub inlier_indices: Vec<usize>,
    /// Inliers projected onto the plane, parallel to `inlier_indices`.
    pub projected_inliers: Vec<Point3D>,
    pub plane: Vector4<f64>,
}

/// Robust plane estimator (e.g. RANSAC).
pub trait PlaneFitter {
    fn fit(&mut self, points: &[Point3D], indices: &[usize]) -> PlaneFit;
}

/// Grid extent of a lattice on its plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeBoundary {
    pub corner: Point3D,
    pub width: u32,
    pub height: u32,
}

/// Basis search and on-grid assignment for points on a fitted plane.
pub trait LatticeDetector {
    fn candidate_vectors(&mut self, inliers: &[Point3D], plane: &Vector4<f64>) -> Vec<Vector3<f64>>;
    /// Zero or two vectors.
    fn final_basis_vectors(&mut self, candidates: &[Vector3<f64>]) -> Vec<Vector3<f64>>;
    fn boundary(&mut self, basis0: &Vector3<f64>, basis1: &Vector3<f64>) -> LatticeBoundary;
    fn on_grid_indices(
        &mut self,
        inlier_indices: &[usize],
        lattice: &LatticeStructure,
    ) -> Vec<GridIndexEntry>;
}

/// A fitted lattice together with the points that support it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lattice {
    pub structure: LatticeStructure,
    pub grid_indices: Vec<GridIndexEntry>,
    pub plane_inliers: Vec<usize>,
    pub projected_inliers: Vec<Point3D>,
}

impl Lattice {
    /// Lattice restored from a record, without inlier information.
    pub fn from_record(structure: LatticeStructure, grid_indices: Vec<GridIndexEntry>) -> Self {
        Self {
            structure,
            grid_indices,
            ..Default::default()
        }
    }
}

impl AsRef<LatticeStructure> for Lattice {
    fn as_ref(&self) -> &LatticeStructure {
        &self.structure
    }
}

/// Runs the plane → basis → boundary → on-grid chain.
pub struct LatticeFitter<P, D> {
    plane_fitter: P,
    detector: D,
}

impl<P: PlaneFitter, D: LatticeDetector> LatticeFitter<P, D> {
    pub fn new(plane_fitter: P, detector: D) -> Self {
        Self {
            plane_fitter,
            detector,
        }
    }

    /// Fits a lattice to the group `indices` of `points`.
    pub fn fit(&mut self, points: &[Point3D], indices: &[usize]) -> Result<Lattice> {
        let plane_fit = self.plane_fitter.fit(points, indices);
        let n = plane_fit.inlier_indices.len();
        debug!("fit: plane {:?} with {n} inliers", plane_fit.plane.as_slice());

        let candidates = self
            .detector
            .candidate_vectors(&plane_fit.projected_inliers, &plane_fit.plane);
        if candidates.len() < 2 || candidates.len() > n * n / 2 {
            debug!(
                "fit: abandoning, {} candidate vectors for {n} inliers",
                candidates.len()
            );
            return Err(LatticeError::InvalidLattice { basis_vectors: 0 });
        }

        let basis = self.detector.final_basis_vectors(&candidates);
        let [b0, b1] = basis.as_slice() else {
            return Err(LatticeError::InvalidLattice {
                basis_vectors: basis.len(),
            });
        };
        let bounds = self.detector.boundary(b0, b1);
        let structure = LatticeStructure::new(
            plane_fit.plane,
            [*b0, *b1],
            bounds.corner,
            bounds.width,
            bounds.height,
        );
        let grid_indices = self
            .detector
            .on_grid_indices(&plane_fit.inlier_indices, &structure);
        info!(
            "fit: lattice {}x{} with {} on-grid points",
            structure.width,
            structure.height,
            grid_indices.len()
        );

        Ok(Lattice {
            structure,
            grid_indices,
            plane_inliers: plane_fit.inlier_indices,
            projected_inliers: plane_fit.projected_inliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plane z = 0 through all points.
    struct FlatPlane;

    impl PlaneFitter for FlatPlane {
        fn fit(&mut self, points: &[Point3D], indices: &[usize]) -> PlaneFit {
            PlaneFit {
                inlier_indices: indices.to_vec(),
                projected_inliers: indices
                    .iter()
                    .map(|&i| Vector3::new(points[i].x, points[i].y, 0.0))
                    .collect(),
                plane: Vector4::new(0.0, 0.0, 1.0, 0.0),
            }
        }
    }

    struct ScriptedDetector {
        candidates: usize,
        basis: Vec<Vector3<f64>>,
    }

    impl LatticeDetector for ScriptedDetector {
        fn candidate_vectors(&mut self, _: &[Point3D], _: &Vector4<f64>) -> Vec<Vector3<f64>> {
            vec![Vector3::x(); self.candidates]
        }

        fn final_basis_vectors(&mut self, _: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
            self.basis.clone()
        }

        fn boundary(&mut self, _: &Vector3<f64>, _: &Vector3<f64>) -> LatticeBoundary {
            LatticeBoundary {
                corner: Vector3::zeros(),
                width: 1,
                height: 1,
            }
        }

        fn on_grid_indices(&mut self, inliers: &[usize], _: &LatticeStructure) -> Vec<GridIndexEntry> {
            inliers
                .iter()
                .enumerate()
                .map(|(k, &i)| GridIndexEntry::new(i, (k % 2) as i32, (k / 2) as i32))
                .collect()
        }
    }

    fn square() -> Vec<Point3D> {
        vec![
            Vector3::new(0.0, 0.0, 0.1),
            Vector3::new(1.0, 0.0, -0.1),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn fit_builds_lattice_from_collaborators() {
        let detector = ScriptedDetector {
            candidates: 3,
            basis: vec![Vector3::x(), Vector3::y()],
        };
        let mut fitter = LatticeFitter::new(FlatPlane, detector);
        let latt = fitter.fit(&square(), &[0, 1, 2, 3]).unwrap();
        assert!(latt.structure.is_valid());
        assert_eq!(latt.plane_inliers, vec![0, 1, 2, 3]);
        assert_eq!(latt.grid_indices.len(), 4);
        assert_eq!(latt.grid_indices[3], GridIndexEntry::new(3, 1, 1));
        assert_eq!(latt.projected_inliers[0].z, 0.0);
    }

    #[test]
    fn fit_abandons_on_candidate_count() {
        let too_few = ScriptedDetector {
            candidates: 1,
            basis: vec![Vector3::x(), Vector3::y()],
        };
        assert!(LatticeFitter::new(FlatPlane, too_few)
            .fit(&square(), &[0, 1, 2, 3])
            .is_err());
        // 4 inliers allow at most 8 candidates.
        let too_many = ScriptedDetector {
            candidates: 9,
            basis: vec![Vector3::x(), Vector3::y()],
        };
        assert!(LatticeFitter::new(FlatPlane, too_many)
            .fit(&square(), &[0, 1, 2, 3])
            .is_err());
    }

    #[test]
    fn fit_requires_two_basis_vectors() {
        let detector = ScriptedDetector {
            candidates: 4,
            basis: vec![Vector3::x()],
        };
        let err = LatticeFitter::new(FlatPlane, detector)
            .fit(&square(), &[0, 1, 2, 3])
            .unwrap_err();
        assert_eq!(err, LatticeError::InvalidLattice { basis_vectors: 1 });
    }
}

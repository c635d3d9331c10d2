//! Frontoparallel view selection.
//!
//! Among the cameras whose view id lies in a configured range, pick the one
//! that sees a 3D point (in front of the camera, inside the image) with its
//! viewing ray best aligned to a reference plane normal. The score is the
//! absolute cosine between ray and normal, so the sign of the plane does not
//! matter. Ties keep the first candidate in input order.

use crate::angle::frontoparallel_score;
use crate::camera::{CameraPose, Intrinsics};
use crate::error::{LatticeError, Result};
use crate::types::{LatticeStructure, Point3D};

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Inclusive range of view ids a selector may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewIdRange {
    pub min: i32,
    pub max: i32,
}

impl ViewIdRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Range accepting every view id.
    pub fn all() -> Self {
        Self {
            min: i32::MIN,
            max: i32::MAX,
        }
    }

    #[inline]
    pub fn contains(&self, view_id: i32) -> bool {
        view_id >= self.min && view_id <= self.max
    }
}

impl Default for ViewIdRange {
    /// Views 45 to 47.
    fn default() -> Self {
        Self { min: 45, max: 47 }
    }
}

/// Winning view for a point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewSelection {
    pub view_id: i32,
    pub pixel: Vector2<f64>,
    pub score: f64,
}

/// Selects the most frontoparallel valid view of a point.
#[derive(Clone, Copy, Debug)]
pub struct ViewSelector<'a> {
    intrinsics: &'a Intrinsics,
    cameras: &'a [CameraPose],
    allowed: ViewIdRange,
}

impl<'a> ViewSelector<'a> {
    pub fn new(intrinsics: &'a Intrinsics, cameras: &'a [CameraPose], allowed: ViewIdRange) -> Self {
        Self {
            intrinsics,
            cameras,
            allowed,
        }
    }

    pub fn allowed(&self) -> ViewIdRange {
        self.allowed
    }

    /// Best view of `point` relative to `plane_normal`, or `None` if no
    /// allowed camera has the point in front of it and inside its image.
    pub fn select_best_view(
        &self,
        point: &Point3D,
        plane_normal: &Vector3<f64>,
    ) -> Option<ViewSelection> {
        let mut best: Option<ViewSelection> = None;
        for cam in self.cameras {
            if !self.allowed.contains(cam.view_id) {
                continue;
            }
            let depth = cam.to_camera(point).z;
            if depth <= 0.0 {
                continue;
            }
            let Some(pixel) = cam.project(self.intrinsics, point) else {
                continue;
            };
            if !cam.contains(&pixel) {
                continue;
            }
            let ray = point - cam.center();
            let score = frontoparallel_score(&ray, plane_normal);
            if best.map_or(true, |b| score > b.score) {
                best = Some(ViewSelection {
                    view_id: cam.view_id,
                    pixel,
                    score,
                });
            }
        }
        best
    }

    /// Position of grid cell `cell` on `lattice` and its best view against the
    /// lattice plane.
    pub fn view_for_cell(
        &self,
        lattice: &LatticeStructure,
        cell: (i32, i32),
    ) -> Result<(Point3D, ViewSelection)> {
        let pos = lattice
            .cell_position(cell.0, cell.1)
            .ok_or(LatticeError::InvalidLattice {
                basis_vectors: lattice.basis_vectors.len(),
            })?;
        let view = self
            .select_best_view(&pos, &lattice.normal())
            .ok_or(LatticeError::NoValidView { cell })?;
        Ok((pos, view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::axis_aligned_pose;

    fn intrinsics() -> Intrinsics {
        Intrinsics::from_focal(400.0, 320.0, 240.0)
    }

    #[test]
    fn picks_most_frontoparallel_camera() {
        let k = intrinsics();
        let cams = vec![
            axis_aligned_pose(45, Vector3::new(1.5, 0.0, -5.0), 640, 480),
            axis_aligned_pose(46, Vector3::new(0.0, 0.0, -5.0), 640, 480),
            axis_aligned_pose(47, Vector3::new(-1.0, 0.5, -5.0), 640, 480),
        ];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        let sel = selector
            .select_best_view(&Vector3::zeros(), &Vector3::z())
            .expect("point is visible");
        assert_eq!(sel.view_id, 46);
        assert!((sel.pixel - Vector2::new(320.0, 240.0)).norm() < 1e-9);
        assert!((sel.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn respects_allowed_range() {
        let k = intrinsics();
        let cams = vec![
            axis_aligned_pose(10, Vector3::new(0.0, 0.0, -5.0), 640, 480),
            axis_aligned_pose(45, Vector3::new(1.0, 0.0, -5.0), 640, 480),
        ];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::new(45, 47));
        let sel = selector
            .select_best_view(&Vector3::zeros(), &Vector3::z())
            .unwrap();
        assert_eq!(sel.view_id, 45);
    }

    #[test]
    fn none_when_all_behind_camera() {
        let k = intrinsics();
        let cams = vec![
            axis_aligned_pose(45, Vector3::new(0.0, 0.0, 5.0), 640, 480),
            axis_aligned_pose(46, Vector3::new(0.2, 0.0, 1.0), 640, 480),
        ];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        assert!(selector
            .select_best_view(&Vector3::zeros(), &Vector3::z())
            .is_none());
    }

    #[test]
    fn none_when_all_projections_leave_image() {
        let k = intrinsics();
        let cams = vec![
            axis_aligned_pose(45, Vector3::new(20.0, 0.0, -1.0), 640, 480),
            axis_aligned_pose(46, Vector3::new(0.0, -20.0, -1.0), 640, 480),
        ];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        assert!(selector
            .select_best_view(&Vector3::zeros(), &Vector3::z())
            .is_none());
    }

    #[test]
    fn ties_keep_first_candidate() {
        let k = intrinsics();
        // Mirror-symmetric cameras give identical scores.
        let cams = vec![
            axis_aligned_pose(47, Vector3::new(1.0, 0.0, -5.0), 640, 480),
            axis_aligned_pose(45, Vector3::new(-1.0, 0.0, -5.0), 640, 480),
        ];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        let sel = selector
            .select_best_view(&Vector3::zeros(), &Vector3::z())
            .unwrap();
        assert_eq!(sel.view_id, 47);
    }

    #[test]
    fn grazing_but_valid_view_is_still_returned() {
        let k = intrinsics();
        let cams = vec![axis_aligned_pose(45, Vector3::new(0.0, 0.0, -5.0), 640, 480)];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        // Plane normal perpendicular to the viewing ray: score 0, still valid.
        let sel = selector
            .select_best_view(&Vector3::zeros(), &Vector3::x())
            .unwrap();
        assert_eq!(sel.view_id, 45);
        assert!(sel.score.abs() < 1e-12);
    }

    #[test]
    fn cell_lookup_reports_unseen_cells() {
        let k = intrinsics();
        let cams = vec![axis_aligned_pose(46, Vector3::new(0.0, 0.0, -5.0), 640, 480)];
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        let lattice = LatticeStructure::new(
            nalgebra::Vector4::new(0.0, 0.0, 1.0, 0.0),
            [Vector3::x(), Vector3::y()],
            Vector3::zeros(),
            40,
            1,
        );
        let (pos, view) = selector.view_for_cell(&lattice, (1, 1)).unwrap();
        assert!((pos - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        assert_eq!(view.view_id, 46);
        // x = 30 projects to 320 + 400 * 30 / 5 px.
        assert_eq!(
            selector.view_for_cell(&lattice, (30, 0)).unwrap_err(),
            LatticeError::NoValidView { cell: (30, 0) }
        );
        assert!(matches!(
            selector.view_for_cell(&LatticeStructure::default(), (0, 0)),
            Err(LatticeError::InvalidLattice { basis_vectors: 0 })
        ));
    }
}

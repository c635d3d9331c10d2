//! Pinhole camera model and the scene container consumed by the pipeline.

use crate::error::{LatticeError, Result};
use crate::types::{Point3D, TriangulatedPoint};

use nalgebra::{Matrix3, Matrix3x4, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Intrinsic calibration `K`, shared by all views of a scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub kmtx: Matrix3<f64>,
}

impl Intrinsics {
    pub fn new(kmtx: Matrix3<f64>) -> Self {
        Self { kmtx }
    }

    pub fn from_focal(focal: f64, cx: f64, cy: f64) -> Self {
        Self {
            kmtx: Matrix3::new(focal, 0.0, cx, 0.0, focal, cy, 0.0, 0.0, 1.0),
        }
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self {
            kmtx: Matrix3::identity(),
        }
    }
}

/// Orientation `[R | t]` of one view, mapping world to camera coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub view_id: i32,
    pub orientation: Matrix3x4<f64>,
    pub width: u32,
    pub height: u32,
}

impl CameraPose {
    pub fn new(view_id: i32, orientation: Matrix3x4<f64>, width: u32, height: u32) -> Self {
        Self {
            view_id,
            orientation,
            width,
            height,
        }
    }

    #[inline]
    pub fn rotation(&self) -> Matrix3<f64> {
        self.orientation.fixed_view::<3, 3>(0, 0).into_owned()
    }

    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.orientation.column(3).into_owned()
    }

    /// Camera centre in world coordinates, `-Rᵀ t`.
    pub fn center(&self) -> Point3D {
        -(self.rotation().transpose() * self.translation())
    }

    /// `R X + t`.
    #[inline]
    pub fn to_camera(&self, point: &Point3D) -> Vector3<f64> {
        self.rotation() * point + self.translation()
    }

    /// Pixel projection of `point`; `None` when the point sits on the
    /// camera plane.
    pub fn project(&self, intrinsics: &Intrinsics, point: &Point3D) -> Option<Vector2<f64>> {
        let x = intrinsics.kmtx * self.to_camera(point);
        if x.z.abs() <= f64::EPSILON {
            return None;
        }
        let px = Vector2::new(x.x / x.z, x.y / x.z);
        (px.x.is_finite() && px.y.is_finite()).then_some(px)
    }

    /// Half-open bounds check `[0, width) × [0, height)`.
    #[inline]
    pub fn contains(&self, pixel: &Vector2<f64>) -> bool {
        pixel.x >= 0.0
            && pixel.y >= 0.0
            && pixel.x < self.width as f64
            && pixel.y < self.height as f64
    }
}

/// Cameras, reconstructed points and image names of one reconstruction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneModel {
    pub intrinsics: Intrinsics,
    pub cameras: Vec<CameraPose>,
    #[serde(default)]
    pub points: Vec<TriangulatedPoint>,
    /// Image file per view id, relative to the scene's image directory.
    #[serde(default)]
    pub image_names: Vec<(i32, String)>,
}

impl SceneModel {
    pub fn camera(&self, view_id: i32) -> Option<&CameraPose> {
        self.cameras.iter().find(|c| c.view_id == view_id)
    }

    pub fn image_name(&self, view_id: i32) -> Option<&str> {
        self.image_names
            .iter()
            .find(|(id, _)| *id == view_id)
            .map(|(_, name)| name.as_str())
    }

    /// Total pixel reprojection error of the given points over all their
    /// measurements.
    pub fn reprojection_error(&self, point_indices: &[usize]) -> Result<f64> {
        let mut total = 0.0;
        for &idx in point_indices {
            let Some(point) = self.points.get(idx) else {
                continue;
            };
            for m in &point.measurements {
                let cam = self
                    .camera(m.view)
                    .ok_or(LatticeError::UnknownView { view_id: m.view })?;
                if let Some(px) = cam.project(&self.intrinsics, &point.pos) {
                    total += (px - m.pos).norm();
                }
            }
        }
        Ok(total)
    }
}

/// Pose looking down `+z` from `center` (identity rotation).
pub fn axis_aligned_pose(view_id: i32, center: Point3D, width: u32, height: u32) -> CameraPose {
    let mut orientation = Matrix3x4::zeros();
    orientation
        .fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&Matrix3::identity());
    orientation.set_column(3, &(-center));
    CameraPose::new(view_id, orientation, width, height)
}

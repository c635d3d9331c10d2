use lattice_consolidation::camera::{axis_aligned_pose, CameraPose, Intrinsics, SceneModel};
use lattice_consolidation::types::{LatticeStructure, Point3D};
use nalgebra::{Vector3, Vector4};

pub const FOCAL: f64 = 500.0;
pub const IMAGE_W: u32 = 640;
pub const IMAGE_H: u32 = 480;
/// Distance of the facade plane from the camera rig.
pub const FACADE_DEPTH: f64 = 10.0;

pub fn intrinsics() -> Intrinsics {
    Intrinsics::from_focal(FOCAL, IMAGE_W as f64 / 2.0, IMAGE_H as f64 / 2.0)
}

/// Views 45, 46, 47 at `x = -1, 2, 5` plus view 12 (outside the default
/// range) right in front of the facade center.
pub fn camera_rig() -> Vec<CameraPose> {
    [(12, 2.0), (45, -1.0), (46, 2.0), (47, 5.0)]
        .into_iter()
        .map(|(id, x)| axis_aligned_pose(id, Vector3::new(x, 1.5, 0.0), IMAGE_W, IMAGE_H))
        .collect()
}

pub fn scene(points: Vec<lattice_consolidation::TriangulatedPoint>) -> SceneModel {
    SceneModel {
        intrinsics: intrinsics(),
        cameras: camera_rig(),
        points,
        image_names: Vec::new(),
    }
}

pub fn facade_plane() -> Vector4<f64> {
    Vector4::new(0.0, 0.0, 1.0, -FACADE_DEPTH)
}

pub fn facade_corner() -> Point3D {
    Vector3::new(0.0, 0.0, FACADE_DEPTH)
}

/// 4 x 3 lattice on the facade with the given basis.
pub fn facade_lattice(b0: Vector3<f64>, b1: Vector3<f64>) -> LatticeStructure {
    LatticeStructure::new(facade_plane(), [b0, b1], facade_corner(), 4, 3)
}

/// Window grid with 1 m spacing along x and y.
pub fn unit_facade() -> LatticeStructure {
    facade_lattice(Vector3::x(), Vector3::y())
}

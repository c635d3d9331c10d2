use nalgebra::{Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// 3D position in reconstruction coordinates.
pub type Point3D = Vector3<f64>;

/// 2D observation of a 3D point in one view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointMeasurement {
    pub pos: Vector2<f64>,
    pub view: i32,
    /// Feature id local to the view, when the measurement came from matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl PointMeasurement {
    pub fn new(pos: Vector2<f64>, view: i32) -> Self {
        Self {
            pos,
            view,
            id: None,
        }
    }
}

/// Reconstructed (or synthesized) 3D point with the views it was seen in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangulatedPoint {
    pub pos: Point3D,
    pub measurements: Vec<PointMeasurement>,
}

impl TriangulatedPoint {
    pub fn new(pos: Point3D, measurements: Vec<PointMeasurement>) -> Self {
        Self { pos, measurements }
    }
}

/// Links a global point index to an integer cell of a lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndexEntry {
    pub point_index: usize,
    pub column: i32,
    pub row: i32,
}

impl GridIndexEntry {
    pub fn new(point_index: usize, column: i32, row: i32) -> Self {
        Self {
            point_index,
            column,
            row,
        }
    }

    #[inline]
    pub fn cell(&self) -> (i32, i32) {
        (self.column, self.row)
    }
}

/// Geometry of a fitted lattice.
///
/// `basis_vectors` holds either nothing (the fit was abandoned) or exactly the
/// two generators. Only the latter is usable for consolidation and
/// densification; see [`LatticeStructure::basis`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeStructure {
    /// Plane `ax + by + cz + d = 0` as `[a, b, c, d]`.
    pub plane: Vector4<f64>,
    pub basis_vectors: Vec<Vector3<f64>>,
    pub corner: Point3D,
    pub width: u32,
    pub height: u32,
}

impl Default for LatticeStructure {
    fn default() -> Self {
        Self {
            plane: Vector4::zeros(),
            basis_vectors: Vec::new(),
            corner: Point3D::zeros(),
            width: 0,
            height: 0,
        }
    }
}

impl LatticeStructure {
    pub fn new(
        plane: Vector4<f64>,
        basis: [Vector3<f64>; 2],
        corner: Point3D,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            plane,
            basis_vectors: basis.to_vec(),
            corner,
            width,
            height,
        }
    }

    /// Plane normal `(a, b, c)`; not normalized.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.plane.xyz()
    }

    /// The two generators, if the lattice is fit.
    pub fn basis(&self) -> Option<[Vector3<f64>; 2]> {
        match self.basis_vectors.as_slice() {
            [b0, b1] => Some([*b0, *b1]),
            _ => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.basis_vectors.len() == 2
    }

    /// Position of grid cell `(i, j)`: `corner + i·b0 + j·b1`.
    pub fn cell_position(&self, column: i32, row: i32) -> Option<Point3D> {
        let [b0, b1] = self.basis()?;
        Some(self.corner + b0 * column as f64 + b1 * row as f64)
    }
}

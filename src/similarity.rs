//! Photometric consistency of two 3D points seen from their best views.

use crate::angle::descriptor_angle;
use crate::descriptor::DescriptorExtractor;
use crate::error::Result;
use crate::types::Point3D;
use crate::view_select::ViewSelector;

use log::debug;
use nalgebra::{DVector, Vector4};

/// Maximum descriptor angle (radians) for two points to count as similar.
pub const SIMILARITY_ANGLE_THRESHOLD: f64 = 0.5;

/// Compares descriptors taken at each point's most frontoparallel view.
pub struct SimilarityChecker<'a, E: DescriptorExtractor + ?Sized> {
    selector: ViewSelector<'a>,
    extractor: &'a E,
}

impl<'a, E: DescriptorExtractor + ?Sized> SimilarityChecker<'a, E> {
    pub fn new(selector: ViewSelector<'a>, extractor: &'a E) -> Self {
        Self {
            selector,
            extractor,
        }
    }

    /// `true` iff both points have a valid view and their descriptors are
    /// closer than [`SIMILARITY_ANGLE_THRESHOLD`]. Any missing view or
    /// extractor failure yields `false`.
    pub fn are_similar(&self, a: &Point3D, b: &Point3D, plane: &Vector4<f64>) -> bool {
        let (Some(da), Some(db)) = (self.describe_point(a, plane), self.describe_point(b, plane))
        else {
            return false;
        };
        match descriptor_angle(&da, &db) {
            Some(theta) => theta < SIMILARITY_ANGLE_THRESHOLD,
            None => {
                debug!("similarity: degenerate descriptor pair");
                false
            }
        }
    }

    fn describe_point(&self, point: &Point3D, plane: &Vector4<f64>) -> Option<DVector<f64>> {
        let Some(view) = self.selector.select_best_view(point, &plane.xyz()) else {
            debug!("similarity: no valid view for point {:?}", point.as_slice());
            return None;
        };
        let described: Result<DVector<f64>> = self.extractor.describe(view.view_id, &view.pixel);
        match described {
            Ok(desc) => Some(desc),
            Err(err) => {
                debug!("similarity: {err}");
                None
            }
        }
    }
}

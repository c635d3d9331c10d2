//! Local descriptors sampled at a pixel of a view.
//!
//! The pipeline only depends on [`DescriptorExtractor`]. [`PatchDescriptor`]
//! is a small reference implementation: a mean-subtracted intensity window
//! around the rounded pixel position.

use crate::error::{LatticeError, Result};
use crate::image::io::{load_grayscale_image, GrayImageU8};

use log::debug;
use nalgebra::{DVector, Vector2};
use std::collections::HashMap;
use std::path::Path;

/// Produces a fixed-length descriptor at `pixel` in view `view_id`.
///
/// Fails with [`LatticeError::DescriptorUnavailable`] when the image cannot be
/// read or the pixel is too close to the border.
pub trait DescriptorExtractor {
    fn describe(&self, view_id: i32, pixel: &Vector2<f64>) -> Result<DVector<f64>>;
}

/// Intensity-patch descriptor over preloaded grayscale images.
#[derive(Clone, Debug)]
pub struct PatchDescriptor {
    images: HashMap<i32, GrayImageU8>,
    radius: usize,
}

impl PatchDescriptor {
    pub const DEFAULT_RADIUS: usize = 4;

    pub fn new(radius: usize) -> Self {
        Self {
            images: HashMap::new(),
            radius,
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn insert_image(&mut self, view_id: i32, image: GrayImageU8) {
        self.images.insert(view_id, image);
    }

    /// Loads every `(view_id, file name)` pair from `dir`. Unreadable images
    /// are skipped with a warning; describing in those views fails later.
    pub fn load_views(dir: &Path, names: &[(i32, String)], radius: usize) -> Self {
        let mut out = Self::new(radius);
        for (view_id, name) in names {
            match load_grayscale_image(&dir.join(name)) {
                Ok(img) => out.insert_image(*view_id, img),
                Err(err) => log::warn!("descriptor: view {view_id}: {err}"),
            }
        }
        debug!("descriptor: loaded {} of {} views", out.images.len(), names.len());
        out
    }
}

impl Default for PatchDescriptor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RADIUS)
    }
}

impl DescriptorExtractor for PatchDescriptor {
    fn describe(&self, view_id: i32, pixel: &Vector2<f64>) -> Result<DVector<f64>> {
        let image = self
            .images
            .get(&view_id)
            .ok_or_else(|| LatticeError::DescriptorUnavailable {
                view_id,
                reason: "image not loaded".into(),
            })?;
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return Err(LatticeError::DescriptorUnavailable {
                view_id,
                reason: "non-finite pixel".into(),
            });
        }
        let (cx, cy) = (pixel.x.round() as i64, pixel.y.round() as i64);
        let mut values = image
            .as_view()
            .window(cx, cy, self.radius)
            .ok_or_else(|| LatticeError::DescriptorUnavailable {
                view_id,
                reason: format!(
                    "patch at ({cx}, {cy}) leaves the {}x{} image",
                    image.width(),
                    image.height()
                ),
            })?;
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter_mut().for_each(|v| *v -= mean);
        Ok(DVector::from_vec(values))
    }
}

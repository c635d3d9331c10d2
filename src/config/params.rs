use crate::consolidate::{ConsolidationParams, PlanePolicy};
use crate::densify::DensifyMode;
use crate::view_select::ViewIdRange;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where densification records live and whether they are recomputed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensifyConfig {
    pub recompute: bool,
    /// Root directory; each lattice gets its own subdirectory.
    pub cache_dir: PathBuf,
}

impl Default for DensifyConfig {
    fn default() -> Self {
        Self {
            recompute: true,
            cache_dir: PathBuf::from("densify_cache"),
        }
    }
}

impl DensifyConfig {
    pub fn mode(&self) -> DensifyMode {
        DensifyMode::from_recompute(self.recompute)
    }

    pub fn lattice_dir(&self, lattice_index: usize) -> PathBuf {
        self.cache_dir.join(format!("lattice_{lattice_index:03}"))
    }
}

/// Tunables shared by consolidation, view selection and densification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeParams {
    pub allowed_views: ViewIdRange,
    pub basis_tolerance: f64,
    pub plane_policy: PlanePolicy,
    pub densify: DensifyConfig,
}

impl Default for LatticeParams {
    fn default() -> Self {
        let consolidation = ConsolidationParams::default();
        Self {
            allowed_views: ViewIdRange::default(),
            basis_tolerance: consolidation.basis_tolerance,
            plane_policy: consolidation.plane_policy,
            densify: DensifyConfig::default(),
        }
    }
}

impl LatticeParams {
    pub fn consolidation(&self) -> ConsolidationParams {
        ConsolidationParams {
            basis_tolerance: self.basis_tolerance,
            plane_policy: self.plane_policy,
        }
    }
}

//! Serializable reports describing a consolidation / densification run.
//!
//! `RunReport` is what the driver writes as JSON; the per-stage structures
//! can also be built directly from library results.

pub mod consolidation;
pub mod densify;
pub mod timing;

pub use consolidation::{ClusterMemberReport, ClusterReport, ConsolidationReport};
pub use densify::DensifyReport;
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};

use serde::Serialize;

/// Full report of one driver run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub consolidation: ConsolidationReport,
    pub densification: Vec<DensifyReport>,
    /// First global index not used by any point after densification.
    pub next_point_index: usize,
    pub timing: TimingBreakdown,
}

use crate::consolidate::Cluster;
use crate::transform::TransformationCode;
use serde::Serialize;
use std::collections::BTreeSet;

/// One lattice inside a cluster.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMemberReport {
    pub input_index: usize,
    pub transform: TransformationCode,
}

/// Cluster membership, reference first.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub reference: usize,
    pub members: Vec<ClusterMemberReport>,
}

/// Result of clustering `lattices` inputs.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationReport {
    pub lattices: usize,
    /// Inputs left out because they are not fit.
    pub skipped: Vec<usize>,
    pub clusters: Vec<ClusterReport>,
    pub elapsed_ms: f64,
}

impl ConsolidationReport {
    pub fn from_clusters<L>(clusters: &[Cluster<L>], lattices: usize, elapsed_ms: f64) -> Self {
        let mut seen = BTreeSet::new();
        let clusters = clusters
            .iter()
            .map(|cluster| {
                let members: Vec<ClusterMemberReport> = cluster
                    .members()
                    .iter()
                    .map(|m| {
                        seen.insert(m.input_index);
                        ClusterMemberReport {
                            input_index: m.input_index,
                            transform: m.transform,
                        }
                    })
                    .collect();
                ClusterReport {
                    reference: cluster.reference().input_index,
                    members,
                }
            })
            .collect();
        Self {
            lattices,
            skipped: (0..lattices).filter(|i| !seen.contains(i)).collect(),
            clusters,
            elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::consolidate;
    use crate::types::LatticeStructure;
    use nalgebra::{Vector3, Vector4};

    #[test]
    fn report_lists_skipped_inputs_and_codes() {
        let good = LatticeStructure::new(
            Vector4::new(0.0, 0.0, 1.0, 0.0),
            [Vector3::x(), Vector3::y()],
            Vector3::zeros(),
            1,
            1,
        );
        let mut swapped = good.clone();
        swapped.basis_vectors.swap(0, 1);
        let inputs = vec![good, LatticeStructure::default(), swapped];
        let clusters = consolidate(&inputs);
        let report = ConsolidationReport::from_clusters(&clusters, inputs.len(), 0.0);

        assert_eq!(report.skipped, vec![1]);
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clusters[0].reference, 2);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["clusters"][0]["members"][1]["inputIndex"], 0);
        assert_eq!(json["clusters"][0]["members"][1]["transform"], 4);
    }
}

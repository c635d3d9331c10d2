//! Symmetry-aware clustering of independently fitted lattices.
//!
//! Two lattices are congruent when their basis vectors agree up to one of the
//! eight relabel/sign-flip symmetries ([`TransformationCode`]). Lattices are
//! processed in input order; every incoming lattice starts a new cluster,
//! becomes its reference frame, and absorbs each existing cluster that has at
//! least one member congruent to it. Absorbed members are re-based so their
//! stored code maps their own frame into the new reference's frame.
//!
//! Merges depend on input order (first matching member wins), so clustering
//! is strictly sequential.

use crate::angle::angle_between;
use crate::transform::TransformationCode;
use crate::types::LatticeStructure;

use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Outcome of comparing two basis vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorMatch {
    NotSimilar,
    SameDirection,
    OppositeDirection,
}

impl VectorMatch {
    #[inline]
    pub fn is_similar(self) -> bool {
        self != VectorMatch::NotSimilar
    }

    #[inline]
    pub fn is_opposite(self) -> bool {
        self == VectorMatch::OppositeDirection
    }
}

/// Predicate deciding whether two basis vectors describe the same grid step.
pub trait VectorSimilarity {
    fn compare(&self, a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> VectorMatch;
}

/// Vectors are similar when their difference (or, for the opposite
/// direction, their sum) is shorter than the tolerance.
#[derive(Clone, Copy, Debug, Default)]
pub struct DifferenceSimilarity;

impl VectorSimilarity for DifferenceSimilarity {
    fn compare(&self, a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> VectorMatch {
        if (a - b).norm() < tolerance {
            VectorMatch::SameDirection
        } else if (a + b).norm() < tolerance {
            VectorMatch::OppositeDirection
        } else {
            VectorMatch::NotSimilar
        }
    }
}

/// Plane compatibility rule applied before comparing bases.
///
/// `AcceptAll` skips the check. `MaxAngle` rejects pairs whose normals differ
/// by more than the given angle, ignoring the sign of the normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanePolicy {
    #[default]
    AcceptAll,
    MaxAngle { max_angle_rad: f64 },
}

impl PlanePolicy {
    pub fn accepts(&self, a: &LatticeStructure, b: &LatticeStructure) -> bool {
        match *self {
            PlanePolicy::AcceptAll => true,
            PlanePolicy::MaxAngle { max_angle_rad } => {
                let angle = angle_between(&a.normal(), &b.normal());
                angle.min(std::f64::consts::PI - angle) <= max_angle_rad
            }
        }
    }
}

/// Parameters of the congruence test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationParams {
    /// Fraction of the shorter vector's length tolerated as mismatch.
    pub basis_tolerance: f64,
    pub plane_policy: PlanePolicy,
}

impl Default for ConsolidationParams {
    fn default() -> Self {
        Self {
            basis_tolerance: 0.1,
            plane_policy: PlanePolicy::AcceptAll,
        }
    }
}

/// A lattice inside a cluster, with the code mapping its frame into the
/// cluster's reference frame.
#[derive(Clone, Debug)]
pub struct ClusterMember<L> {
    pub lattice: L,
    /// Position of the lattice in the consolidation input.
    pub input_index: usize,
    pub transform: TransformationCode,
}

/// Lattices describing one physical grid. The first member is the reference
/// and always carries the identity code.
#[derive(Clone, Debug)]
pub struct Cluster<L> {
    members: Vec<ClusterMember<L>>,
}

impl<L> Cluster<L> {
    fn singleton(lattice: L, input_index: usize) -> Self {
        Self {
            members: vec![ClusterMember {
                lattice,
                input_index,
                transform: TransformationCode::Identity,
            }],
        }
    }

    pub fn reference(&self) -> &ClusterMember<L> {
        &self.members[0]
    }

    pub fn members(&self) -> &[ClusterMember<L>] {
        &self.members
    }

    pub fn into_members(self) -> Vec<ClusterMember<L>> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Moves all members of `source` into `self`, re-basing each stored code
    /// `L -> R` to `L -> C` through `R -> C` (`ref_to_self`).
    fn absorb(&mut self, source: Cluster<L>, ref_to_self: TransformationCode) {
        for mut member in source.members {
            member.transform = member.transform.then(ref_to_self);
            self.members.push(member);
        }
    }
}

/// Clusters congruent lattices.
#[derive(Clone, Debug)]
pub struct LatticeConsolidator<S = DifferenceSimilarity> {
    params: ConsolidationParams,
    similarity: S,
}

impl LatticeConsolidator<DifferenceSimilarity> {
    pub fn new(params: ConsolidationParams) -> Self {
        Self {
            params,
            similarity: DifferenceSimilarity,
        }
    }
}

impl Default for LatticeConsolidator<DifferenceSimilarity> {
    fn default() -> Self {
        Self::new(ConsolidationParams::default())
    }
}

impl<S: VectorSimilarity> LatticeConsolidator<S> {
    pub fn with_similarity(params: ConsolidationParams, similarity: S) -> Self {
        Self { params, similarity }
    }

    pub fn params(&self) -> &ConsolidationParams {
        &self.params
    }

    /// Code mapping `b`'s basis frame into `a`'s, or `None` when the lattices
    /// are not congruent (or either is unfit).
    pub fn match_transform(
        &self,
        a: &LatticeStructure,
        b: &LatticeStructure,
    ) -> Option<TransformationCode> {
        if !self.params.plane_policy.accepts(a, b) {
            return None;
        }
        let [a0, a1] = a.basis()?;
        let [b0, b1] = b.basis()?;

        let same_0 = self.compare(&a0, &b0);
        let same_1 = self.compare(&a1, &b1);
        if same_0.is_similar() && same_1.is_similar() {
            return Some(TransformationCode::from_parts(
                false,
                same_0.is_opposite(),
                same_1.is_opposite(),
            ));
        }

        let cross_0 = self.compare(&a0, &b1);
        let cross_1 = self.compare(&a1, &b0);
        if cross_0.is_similar() && cross_1.is_similar() {
            return Some(TransformationCode::from_parts(
                true,
                cross_0.is_opposite(),
                cross_1.is_opposite(),
            ));
        }
        None
    }

    fn compare(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> VectorMatch {
        let tolerance = a.norm().min(b.norm()) * self.params.basis_tolerance;
        self.similarity.compare(a, b, tolerance)
    }

    /// Clusters `lattices` in input order. Unfit lattices are skipped.
    pub fn consolidate<L, I>(&self, lattices: I) -> Vec<Cluster<L>>
    where
        L: AsRef<LatticeStructure>,
        I: IntoIterator<Item = L>,
    {
        let mut clusters: Vec<Cluster<L>> = Vec::new();
        let mut processed = 0usize;

        for (input_index, lattice) in lattices.into_iter().enumerate() {
            let basis_count = lattice.as_ref().basis_vectors.len();
            if basis_count != 2 {
                warn!("consolidate: skipping lattice {input_index} ({basis_count} basis vectors)");
                continue;
            }
            processed += 1;

            let mut candidate = Cluster::singleton(lattice, input_index);
            for existing in std::mem::take(&mut clusters) {
                match self.link_to_candidate(candidate.reference(), &existing) {
                    Some(ref_to_candidate) => {
                        debug!(
                            "consolidate: lattice {input_index} absorbs cluster of {} (R->C = {ref_to_candidate})",
                            existing.len()
                        );
                        candidate.absorb(existing, ref_to_candidate);
                    }
                    None => clusters.push(existing),
                }
            }
            clusters.push(candidate);
        }

        info!(
            "consolidate: {processed} lattices -> {} clusters",
            clusters.len()
        );
        clusters
    }

    /// `R -> C` for the reference `R` of `existing`, via its first member
    /// congruent to the candidate `C`.
    fn link_to_candidate<L: AsRef<LatticeStructure>>(
        &self,
        candidate: &ClusterMember<L>,
        existing: &Cluster<L>,
    ) -> Option<TransformationCode> {
        existing.members.iter().find_map(|member| {
            let member_to_candidate =
                self.match_transform(candidate.lattice.as_ref(), member.lattice.as_ref())?;
            let ref_to_member = member.transform.invert();
            Some(ref_to_member.then(member_to_candidate))
        })
    }
}

impl AsRef<LatticeStructure> for LatticeStructure {
    fn as_ref(&self) -> &LatticeStructure {
        self
    }
}

/// Convenience wrapper over [`LatticeConsolidator::consolidate`] with default
/// parameters.
pub fn consolidate<L, I>(lattices: I) -> Vec<Cluster<L>>
where
    L: AsRef<LatticeStructure>,
    I: IntoIterator<Item = L>,
{
    LatticeConsolidator::new(ConsolidationParams::default()).consolidate(lattices)
}

//! Grid densification: synthesize 3D points for empty lattice cells.
//!
//! Every cell `(i, j)` with `0 <= i <= width`, `0 <= j <= height` that has no
//! on-grid point gets the position `corner + i·b0 + j·b1` and, as its only
//! measurement, the projection into its most frontoparallel allowed view.
//! New points receive consecutive global indices starting at the caller's
//! `start_index`, so several lattices can be densified in sequence into one
//! contiguous index space.
//!
//! Results are persisted as two records (points, grid entries). Reloading
//! restores the points verbatim but reassigns entry indices from
//! `start_index`; records must therefore be reloaded with the same start
//! offsets they were written with.

use crate::error::{LatticeError, Result};
use crate::records::{
    parse_entries, parse_points, write_entries, write_points, RecordKind, RecordStore,
};
use crate::types::{GridIndexEntry, LatticeStructure, Point3D, PointMeasurement, TriangulatedPoint};
use crate::view_select::{ViewSelection, ViewSelector};

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// Whether to sweep the lattice or reuse persisted records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensifyMode {
    Recompute,
    Reload,
}

impl DensifyMode {
    pub fn from_recompute(recompute: bool) -> Self {
        if recompute {
            DensifyMode::Recompute
        } else {
            DensifyMode::Reload
        }
    }
}

/// What happened to one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellOutcome {
    /// A reconstructed point already covers the cell.
    Occupied,
    /// A point was synthesized with the given index and view.
    Added { point_index: usize, view_id: i32 },
    /// No allowed view sees the cell; it is left empty.
    NoView,
    /// The entry was restored from a persisted record.
    Restored { point_index: usize },
}

/// Progress event reported for every visited cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensifyProgress {
    pub cell: (i32, i32),
    pub outcome: CellOutcome,
}

/// Points and entries produced by one densification call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DensifyOutput {
    pub points: Vec<TriangulatedPoint>,
    pub entries: Vec<GridIndexEntry>,
    pub next_index: usize,
    /// Cells left empty because no valid view exists.
    pub skipped_cells: Vec<(i32, i32)>,
}

impl DensifyOutput {
    /// Global indices assigned to the new points.
    pub fn index_range(&self) -> Range<usize> {
        self.next_index - self.points.len()..self.next_index
    }
}

enum CellState {
    Occupied,
    Missing(Result<(Point3D, ViewSelection)>),
}

/// Fills empty lattice cells using a [`ViewSelector`].
#[derive(Clone, Copy, Debug)]
pub struct GridDensifier<'a> {
    selector: ViewSelector<'a>,
}

impl<'a> GridDensifier<'a> {
    pub fn new(selector: ViewSelector<'a>) -> Self {
        Self { selector }
    }

    /// [`densify_with_progress`](Self::densify_with_progress) without a
    /// progress sink.
    pub fn densify<S: RecordStore + ?Sized>(
        &self,
        lattice: &LatticeStructure,
        occupied: &mut Vec<GridIndexEntry>,
        start_index: usize,
        mode: DensifyMode,
        store: &mut S,
    ) -> Result<DensifyOutput> {
        self.densify_with_progress(lattice, occupied, start_index, mode, store, |_| {})
    }

    /// Densifies `lattice` and appends the new entries to `occupied`.
    ///
    /// Fails with [`LatticeError::InvalidLattice`] for unfit lattices and
    /// with `Io` / `MalformedRecord` when records cannot be written or read
    /// back; nothing is appended to `occupied` in that case.
    pub fn densify_with_progress<S, F>(
        &self,
        lattice: &LatticeStructure,
        occupied: &mut Vec<GridIndexEntry>,
        start_index: usize,
        mode: DensifyMode,
        store: &mut S,
        mut progress: F,
    ) -> Result<DensifyOutput>
    where
        S: RecordStore + ?Sized,
        F: FnMut(DensifyProgress),
    {
        if !lattice.is_valid() {
            return Err(LatticeError::InvalidLattice {
                basis_vectors: lattice.basis_vectors.len(),
            });
        }
        let output = match mode {
            DensifyMode::Recompute => {
                let output = self.sweep(lattice, occupied, start_index, &mut progress);
                store.write_record(RecordKind::DensifyPoints, &write_points(&output.points))?;
                store.write_record(RecordKind::DensifyIndices, &write_entries(&output.entries))?;
                output
            }
            DensifyMode::Reload => reload(store, start_index, &mut progress)?,
        };
        occupied.extend_from_slice(&output.entries);
        info!(
            "densify: {:?} added {} points (indices {:?}), {} cells without view",
            mode,
            output.points.len(),
            output.index_range(),
            output.skipped_cells.len()
        );
        Ok(output)
    }

    fn sweep<F: FnMut(DensifyProgress)>(
        &self,
        lattice: &LatticeStructure,
        occupied: &[GridIndexEntry],
        start_index: usize,
        progress: &mut F,
    ) -> DensifyOutput {
        let taken: HashSet<(i32, i32)> = occupied.iter().map(GridIndexEntry::cell).collect();
        let cells: Vec<(i32, i32)> = (0..=lattice.width as i32)
            .flat_map(|i| (0..=lattice.height as i32).map(move |j| (i, j)))
            .collect();

        // View search is independent per cell; index assignment below stays
        // in sweep order.
        let states: Vec<CellState> = cells
            .par_iter()
            .map(|&cell| {
                if taken.contains(&cell) {
                    CellState::Occupied
                } else {
                    CellState::Missing(self.selector.view_for_cell(lattice, cell))
                }
            })
            .collect();

        let mut output = DensifyOutput {
            next_index: start_index,
            ..Default::default()
        };
        for (&cell, state) in cells.iter().zip(states) {
            let outcome = match state {
                CellState::Occupied => CellOutcome::Occupied,
                CellState::Missing(Err(err)) => {
                    debug!("densify: {err}, skipped");
                    output.skipped_cells.push(cell);
                    CellOutcome::NoView
                }
                CellState::Missing(Ok((pos, view))) => {
                    let point_index = output.next_index;
                    output.next_index += 1;
                    output.points.push(TriangulatedPoint::new(
                        pos,
                        vec![PointMeasurement::new(view.pixel, view.view_id)],
                    ));
                    output
                        .entries
                        .push(GridIndexEntry::new(point_index, cell.0, cell.1));
                    CellOutcome::Added {
                        point_index,
                        view_id: view.view_id,
                    }
                }
            };
            progress(DensifyProgress { cell, outcome });
        }
        output
    }
}

fn reload<S, F>(store: &S, start_index: usize, progress: &mut F) -> Result<DensifyOutput>
where
    S: RecordStore + ?Sized,
    F: FnMut(DensifyProgress),
{
    let points = parse_points(&store.read_record(RecordKind::DensifyPoints)?)?;
    let stored = parse_entries(&store.read_record(RecordKind::DensifyIndices)?)?;
    if stored.len() != points.len() {
        return Err(LatticeError::MalformedRecord {
            record: RecordKind::DensifyIndices.file_name().to_string(),
            reason: format!(
                "{} entries for {} densified points",
                stored.len(),
                points.len()
            ),
        });
    }

    let entries: Vec<GridIndexEntry> = stored
        .iter()
        .enumerate()
        .map(|(k, e)| GridIndexEntry::new(start_index + k, e.column, e.row))
        .collect();
    for e in &entries {
        progress(DensifyProgress {
            cell: e.cell(),
            outcome: CellOutcome::Restored {
                point_index: e.point_index,
            },
        });
    }
    Ok(DensifyOutput {
        next_index: start_index + points.len(),
        points,
        entries,
        skipped_cells: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{axis_aligned_pose, CameraPose, Intrinsics};
    use crate::records::MemoryStore;
    use crate::view_select::ViewIdRange;
    use nalgebra::{Vector3, Vector4};

    fn facade() -> LatticeStructure {
        LatticeStructure::new(
            Vector4::new(0.0, 0.0, 1.0, 0.0),
            [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)],
            Vector3::new(-1.0, -1.0, 0.0),
            2,
            2,
        )
    }

    fn rig() -> (Intrinsics, Vec<CameraPose>) {
        (
            Intrinsics::from_focal(300.0, 320.0, 240.0),
            vec![
                axis_aligned_pose(45, Vector3::new(0.5, 0.0, -6.0), 640, 480),
                axis_aligned_pose(46, Vector3::new(0.0, 0.0, -6.0), 640, 480),
            ],
        )
    }

    #[test]
    fn recompute_fills_only_missing_cells() {
        let (k, cams) = rig();
        let densifier = GridDensifier::new(ViewSelector::new(&k, &cams, ViewIdRange::default()));
        let mut occupied = vec![GridIndexEntry::new(3, 0, 0), GridIndexEntry::new(8, 1, 1)];
        let mut store = MemoryStore::default();
        let mut events = Vec::new();

        let out = densifier
            .densify_with_progress(
                &facade(),
                &mut occupied,
                100,
                DensifyMode::Recompute,
                &mut store,
                |p| events.push(p),
            )
            .unwrap();

        assert_eq!(out.points.len(), 7);
        assert_eq!(out.next_index, 107);
        assert_eq!(out.index_range(), 100..107);
        assert_eq!(events.len(), 9);
        assert_eq!(events[0].outcome, CellOutcome::Occupied);
        let indices: Vec<usize> = out.entries.iter().map(|e| e.point_index).collect();
        assert_eq!(indices, (100..107).collect::<Vec<_>>());
        assert_eq!(out.entries[0].cell(), (0, 1));

        let cells: HashSet<(i32, i32)> = occupied.iter().map(|e| e.cell()).collect();
        assert_eq!(occupied.len(), 9);
        assert_eq!(cells.len(), 9);
        assert!(store.get(RecordKind::DensifyPoints).is_some());
    }

    #[test]
    fn synthesized_point_uses_best_view_projection() {
        let (k, cams) = rig();
        let densifier = GridDensifier::new(ViewSelector::new(&k, &cams, ViewIdRange::default()));
        let mut occupied = Vec::new();
        let out = densifier
            .densify(&facade(), &mut occupied, 0, DensifyMode::Recompute, &mut MemoryStore::default())
            .unwrap();
        // Cell (1, 1) sits at the origin, straight ahead of view 46.
        let k_11 = out.entries.iter().position(|e| e.cell() == (1, 1)).unwrap();
        let p = &out.points[k_11];
        assert_eq!(p.pos, Vector3::zeros());
        assert_eq!(p.measurements.len(), 1);
        assert_eq!(p.measurements[0].view, 46);
        assert!((p.measurements[0].pos - nalgebra::Vector2::new(320.0, 240.0)).norm() < 1e-9);
    }

    #[test]
    fn cells_without_view_are_skipped() {
        let (k, mut cams) = rig();
        cams.truncate(1);
        let selector = ViewSelector::new(&k, &cams, ViewIdRange::default());
        let densifier = GridDensifier::new(selector);
        let mut latt = facade();
        // Push the right column far outside the image.
        latt.basis_vectors[0] = Vector3::new(20.0, 0.0, 0.0);
        latt.corner = Vector3::new(0.0, -1.0, 0.0);
        let out = densifier
            .densify(&latt, &mut Vec::new(), 5, DensifyMode::Recompute, &mut MemoryStore::default())
            .unwrap();
        assert_eq!(out.skipped_cells, vec![(1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
        assert_eq!(out.points.len(), 3);
        assert_eq!(out.next_index, 8);
    }

    #[test]
    fn reload_reassigns_indices_from_start() {
        let (k, cams) = rig();
        let densifier = GridDensifier::new(ViewSelector::new(&k, &cams, ViewIdRange::default()));
        let mut store = MemoryStore::default();
        let first = densifier
            .densify(&facade(), &mut Vec::new(), 10, DensifyMode::Recompute, &mut store)
            .unwrap();

        let mut occupied = Vec::new();
        let again = densifier
            .densify(&facade(), &mut occupied, 40, DensifyMode::Reload, &mut store)
            .unwrap();
        assert_eq!(again.points, first.points);
        assert_eq!(again.next_index, 40 + first.points.len());
        for (a, b) in again.entries.iter().zip(&first.entries) {
            assert_eq!(a.cell(), b.cell());
            assert_eq!(a.point_index, b.point_index + 30);
        }
        assert_eq!(occupied, again.entries);
    }

    #[test]
    fn reload_without_records_fails_and_leaves_occupied() {
        let (k, cams) = rig();
        let densifier = GridDensifier::new(ViewSelector::new(&k, &cams, ViewIdRange::default()));
        let mut occupied = vec![GridIndexEntry::new(0, 0, 0)];
        let err = densifier
            .densify(&facade(), &mut occupied, 1, DensifyMode::Reload, &mut MemoryStore::default())
            .unwrap_err();
        assert!(matches!(err, LatticeError::Io { .. }));
        assert_eq!(occupied.len(), 1);
    }

    #[test]
    fn reload_rejects_mismatched_records() {
        let (k, cams) = rig();
        let densifier = GridDensifier::new(ViewSelector::new(&k, &cams, ViewIdRange::default()));
        let mut store = MemoryStore::default();
        store
            .write_record(RecordKind::DensifyPoints, "1\n0 0 0 1 45 -1 1 1\n")
            .unwrap();
        store.write_record(RecordKind::DensifyIndices, "0\n").unwrap();
        let err = densifier
            .densify(&facade(), &mut Vec::new(), 0, DensifyMode::Reload, &mut store)
            .unwrap_err();
        assert!(matches!(err, LatticeError::MalformedRecord { .. }));
    }

    #[test]
    fn unfit_lattice_is_rejected() {
        let (k, cams) = rig();
        let densifier = GridDensifier::new(ViewSelector::new(&k, &cams, ViewIdRange::default()));
        let err = densifier
            .densify(
                &LatticeStructure::default(),
                &mut Vec::new(),
                0,
                DensifyMode::Recompute,
                &mut MemoryStore::default(),
            )
            .unwrap_err();
        assert_eq!(err, LatticeError::InvalidLattice { basis_vectors: 0 });
    }
}

use crate::densify::{DensifyMode, DensifyOutput};
use serde::Serialize;

/// Summary of densifying one lattice.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DensifyReport {
    pub lattice_index: usize,
    pub mode: DensifyMode,
    pub added: usize,
    pub first_index: usize,
    pub next_index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_cells: Vec<(i32, i32)>,
    pub elapsed_ms: f64,
}

impl DensifyReport {
    pub fn new(lattice_index: usize, mode: DensifyMode, output: &DensifyOutput, elapsed_ms: f64) -> Self {
        let range = output.index_range();
        Self {
            lattice_index,
            mode,
            added: output.points.len(),
            first_index: range.start,
            next_index: range.end,
            skipped_cells: output.skipped_cells.clone(),
            elapsed_ms,
        }
    }
}

use lattice_consolidation::camera::{axis_aligned_pose, Intrinsics, SceneModel};
use lattice_consolidation::config::{load_config, RuntimeConfig};
use lattice_consolidation::diagnostics::{
    elapsed_ms, ConsolidationReport, DensifyReport, RunReport, TimingBreakdown,
};
use lattice_consolidation::fit::Lattice;
use lattice_consolidation::image::io::write_json_file;
use lattice_consolidation::records::{parse_lattice, DirectoryStore, MemoryStore};
use lattice_consolidation::{
    Cluster, ConsolidationParams, DensifyMode, GridDensifier, GridIndexEntry, LatticeConsolidator,
    LatticeStructure, ViewIdRange, ViewSelector,
};
use nalgebra::{Vector3, Vector4};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    match env::args().nth(1) {
        Some(path) => run_config(Path::new(&path)),
        None => run_synthetic(),
    }
}

fn run_config(path: &Path) -> Result<(), String> {
    let start = Instant::now();
    let config: RuntimeConfig = load_config(path)?;
    let params = &config.params;
    let mut timing = TimingBreakdown::default();

    let mut scene = timing.time("load_scene", || load_scene(&config.scene))?;
    let mut lattices = timing.time("load_lattices", || {
        config
            .lattices
            .iter()
            .map(|p| load_lattice(p))
            .collect::<Result<Vec<_>, String>>()
    })?;

    let consolidation_start = Instant::now();
    let clusters = LatticeConsolidator::new(params.consolidation())
        .consolidate(lattices.iter().map(|l| l.structure.clone()));
    let consolidation_ms = elapsed_ms(consolidation_start);
    timing.push("consolidate", consolidation_ms);
    let consolidation =
        ConsolidationReport::from_clusters(&clusters, lattices.len(), consolidation_ms);

    let mode = params.densify.mode();
    let first_new = scene.points.len();
    let mut next_index = first_new;
    let mut densification = Vec::new();
    let densify_start = Instant::now();
    {
        let selector = ViewSelector::new(&scene.intrinsics, &scene.cameras, params.allowed_views);
        let densifier = GridDensifier::new(selector);
        for (i, lattice) in lattices.iter_mut().enumerate() {
            if !lattice.structure.is_valid() {
                continue;
            }
            let mut store = DirectoryStore::new(params.densify.lattice_dir(i));
            let lattice_start = Instant::now();
            let output = densifier
                .densify(
                    &lattice.structure,
                    &mut lattice.grid_indices,
                    next_index,
                    mode,
                    &mut store,
                )
                .map_err(|e| format!("Failed to densify lattice {i}: {e}"))?;
            next_index = output.next_index;
            densification.push(DensifyReport::new(i, mode, &output, elapsed_ms(lattice_start)));
            scene.points.extend(output.points);
        }
    }
    timing.push("densify", elapsed_ms(densify_start));

    let added: Vec<usize> = (first_new..next_index).collect();
    let reprojection = scene.reprojection_error(&added).map_err(|e| e.to_string())?;
    timing.total_ms = elapsed_ms(start);

    let report = RunReport {
        consolidation,
        densification,
        next_point_index: next_index,
        timing,
    };
    print_summary(&report, &clusters);
    println!("  reprojection error of added points: {reprojection:.4} px");

    if let Some(out) = &config.output.json_out {
        write_json_file(out, &report)?;
        println!("JSON report written to {}", out.display());
    }
    Ok(())
}

fn load_scene(path: &Path) -> Result<SceneModel, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read scene {}: {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse scene {}: {e}", path.display()))
}

/// Blank records stand for lattices whose fit was abandoned.
fn load_lattice(path: &Path) -> Result<Lattice, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read lattice {}: {e}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Lattice::default());
    }
    let (structure, entries) =
        parse_lattice(&contents).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(Lattice::from_record(structure, entries))
}

fn print_summary<L>(report: &RunReport, clusters: &[Cluster<L>]) {
    let c = &report.consolidation;
    println!("Consolidation summary");
    println!(
        "  lattices: {} ({} skipped), clusters: {}",
        c.lattices,
        c.skipped.len(),
        clusters.len()
    );
    for (k, cluster) in clusters.iter().enumerate() {
        let members: Vec<String> = cluster
            .members()
            .iter()
            .map(|m| format!("{}:{}", m.input_index, m.transform))
            .collect();
        println!("  cluster {k}: {}", members.join(" "));
    }
    if !report.densification.is_empty() {
        println!("Densification summary");
    }
    for d in &report.densification {
        println!(
            "  lattice {}: {} points, indices {}..{}, {} cells without view",
            d.lattice_index,
            d.added,
            d.first_index,
            d.next_index,
            d.skipped_cells.len()
        );
    }
    println!("  total_ms: {:.3}", report.timing.total_ms);
}

/// Three overlapping detections of one facade grid plus an unrelated one.
fn run_synthetic() -> Result<(), String> {
    let plane = Vector4::new(0.0, 0.0, 1.0, -10.0);
    let corner = Vector3::new(0.0, 0.0, 10.0);
    let facade = |b0: Vector3<f64>, b1: Vector3<f64>| {
        LatticeStructure::new(plane, [b0, b1], corner, 4, 3)
    };
    let lattices = vec![
        facade(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)),
        facade(Vector3::new(0.0, 1.04, 0.0), Vector3::new(1.04, 0.0, 0.0)),
        facade(Vector3::new(-0.97, 0.0, 0.0), Vector3::new(0.0, -0.97, 0.0)),
        facade(Vector3::new(2.5, 0.0, 0.0), Vector3::new(0.0, 1.8, 0.0)),
    ];

    let start = Instant::now();
    let clusters = LatticeConsolidator::new(ConsolidationParams::default()).consolidate(&lattices);
    let consolidation =
        ConsolidationReport::from_clusters(&clusters, lattices.len(), elapsed_ms(start));

    let intrinsics = Intrinsics::from_focal(500.0, 320.0, 240.0);
    let cameras: Vec<_> = [(45, -1.0), (46, 2.0), (47, 5.0)]
        .into_iter()
        .map(|(id, x)| axis_aligned_pose(id, Vector3::new(x, 1.5, 0.0), 640, 480))
        .collect();
    let selector = ViewSelector::new(&intrinsics, &cameras, ViewIdRange::default());
    let densifier = GridDensifier::new(selector);
    let mut occupied = vec![GridIndexEntry::new(0, 0, 0), GridIndexEntry::new(1, 2, 1)];
    let mut store = MemoryStore::default();
    let start = Instant::now();
    let output = densifier
        .densify(&lattices[0], &mut occupied, 2, DensifyMode::Recompute, &mut store)
        .map_err(|e| e.to_string())?;
    let densify = DensifyReport::new(0, DensifyMode::Recompute, &output, elapsed_ms(start));

    let report = RunReport {
        consolidation,
        next_point_index: output.next_index,
        densification: vec![densify],
        timing: TimingBreakdown::default(),
    };
    print_summary(&report, &clusters);
    Ok(())
}

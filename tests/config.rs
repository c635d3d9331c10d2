mod common;

use common::facade::{scene, unit_facade};
use lattice_consolidation::camera::SceneModel;
use lattice_consolidation::config::load_config;
use lattice_consolidation::image::io::write_json_file;
use lattice_consolidation::records::{load_lattice_file, save_lattice_file};
use lattice_consolidation::{DensifyMode, GridIndexEntry, PlanePolicy, ViewIdRange};
use std::fs;
use std::path::PathBuf;

#[test]
fn runtime_config_points_at_loadable_inputs() {
    let dir = std::env::temp_dir().join(format!("lattice_config_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let scene_path = dir.join("scene.json");
    write_json_file(&scene_path, &scene(Vec::new())).unwrap();
    let lattice_path = dir.join("lattice_0.txt");
    save_lattice_file(&lattice_path, &unit_facade(), &[GridIndexEntry::new(4, 1, 2)]).unwrap();

    let config_path = dir.join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "scene": "{}",
                "lattices": ["{}"],
                "output": {{ "json_out": "report.json" }},
                "params": {{
                    "allowed_views": {{ "min": 40, "max": 50 }},
                    "plane_policy": {{ "kind": "accept_all" }},
                    "densify": {{ "recompute": false, "cache_dir": "cache" }}
                }}
            }}"#,
            scene_path.display(),
            lattice_path.display()
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    assert_eq!(config.params.allowed_views, ViewIdRange::new(40, 50));
    assert_eq!(config.params.plane_policy, PlanePolicy::AcceptAll);
    assert_eq!(config.params.basis_tolerance, 0.1);
    assert_eq!(config.params.densify.mode(), DensifyMode::Reload);
    assert_eq!(config.output.json_out, Some(PathBuf::from("report.json")));

    let loaded: SceneModel =
        serde_json::from_str(&fs::read_to_string(&config.scene).unwrap()).unwrap();
    assert_eq!(loaded.cameras.len(), 4);
    assert!(loaded.camera(46).is_some());

    let (lattice, entries) = load_lattice_file(&config.lattices[0]).unwrap();
    assert_eq!(lattice, unit_facade());
    assert_eq!(entries, vec![GridIndexEntry::new(4, 1, 2)]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_config_names_the_file() {
    let path = std::env::temp_dir().join(format!("lattice_bad_config_{}.json", std::process::id()));
    fs::write(&path, "{ \"scene\": 3 }").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(err.starts_with("Failed to parse config"), "{err}");
    let _ = fs::remove_file(&path);
}

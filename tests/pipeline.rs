use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use segmented_heat::Error;
use segmented_heat::converter::convert_mesh;
use segmented_heat::io::CellKind;
use segmented_heat::io::msh::read_msh;
use segmented_heat::io::vtu::{read_cell_mesh, read_nodal_field};
use segmented_heat::io::write_to_csv::write_nodal_csv;
use segmented_heat::mesh_builder::{MeshParams, create_msh};
use segmented_heat::solver::{
    LinearSolver, TEMPERATURE_FIELD, Temperature, ThermalParams, solve_thermal_problem,
};
use segmented_heat::tags::TagDictionary;
use tempfile::TempDir;

struct Case {
    dir: TempDir,
    mesh: MeshParams,
    volume_file: PathBuf,
    boundary_file: PathBuf,
    tags: TagDictionary,
}

impl Case {
    fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("outputs").join(name)
    }
    fn solve(&self, params: &ThermalParams) -> segmented_heat::Result<Temperature> {
        solve_thermal_problem(
            &self.volume_file,
            &self.boundary_file,
            &self.output("temperature.vtu"),
            &self.tags,
            params,
        )
    }
}

fn mesh_params(dir: &Path, num_segments: usize, mesh_size: f64) -> MeshParams {
    MeshParams {
        num_segments,
        mesh_size,
        mesh_file: dir.join("mesh").join("square_mesh.msh"),
        tags_file: dir.join("mesh").join("tags.json"),
        ..MeshParams::default()
    }
}

fn prepare(num_segments: usize, mesh_size: f64) -> Case {
    let dir = tempfile::tempdir().unwrap();
    let mesh = mesh_params(dir.path(), num_segments, mesh_size);
    let tags = create_msh(&mesh).unwrap();
    let volume_file = dir.path().join("mesh").join("square_mesh.vtu");
    let boundary_file = dir.path().join("mesh").join("square_lines.vtu");
    convert_mesh(&mesh.mesh_file, &volume_file, &boundary_file).unwrap();
    Case {
        dir,
        mesh,
        volume_file,
        boundary_file,
        tags,
    }
}

#[test]
fn test_tag_dictionary_has_one_entry_per_boundary_line() {
    for n in [1, 3, 4, 7] {
        let dir = tempfile::tempdir().unwrap();
        let params = mesh_params(dir.path(), n, 0.1);
        let tags = create_msh(&params).unwrap();
        assert_eq!(tags.len(), n + 3);
        let keys: Vec<i32> = tags.iter().map(|(tag, _)| tag).collect();
        assert_eq!(keys, (1..=(n as i32 + 3)).collect::<Vec<_>>());
        assert_eq!(tags.name(n as i32 + 2), Some("Top Edge"));

        let text = fs::read_to_string(&params.tags_file).unwrap();
        assert!(text.contains("\n    \"1\": \"Segment 1\""));
        assert_eq!(TagDictionary::read(&params.tags_file).unwrap(), tags);

        let msh = read_msh(&params.mesh_file).unwrap();
        let line_blocks = msh
            .blocks
            .iter()
            .filter(|b| b.kind == CellKind::Line)
            .count();
        assert_eq!(line_blocks, n + 3);
        assert_eq!(msh.physical_names.len(), n + 4);
    }
}

#[test]
fn test_conversion_preserves_cells_and_tags() {
    let dir = tempfile::tempdir().unwrap();
    let params = mesh_params(dir.path(), 4, 0.1);
    create_msh(&params).unwrap();
    let msh = read_msh(&params.mesh_file).unwrap();
    let volume_file = dir.path().join("volume.vtu");
    let boundary_file = dir.path().join("lines.vtu");
    let summary = convert_mesh(&params.mesh_file, &volume_file, &boundary_file).unwrap();

    assert_eq!(summary.point_num, msh.points.nrows());
    assert_eq!(summary.triangle_num, msh.cell_count(CellKind::Triangle));
    assert_eq!(summary.line_num, msh.cell_count(CellKind::Line));

    let volume = read_cell_mesh(&volume_file).unwrap();
    let lines = read_cell_mesh(&boundary_file).unwrap();
    assert_eq!(volume.kind, CellKind::Triangle);
    assert_eq!(volume.cells, msh.cells(CellKind::Triangle).unwrap());
    assert_eq!(lines.kind, CellKind::Line);
    assert_eq!(lines.points, volume.points);
    assert_eq!(lines.tags, msh.physical_tags(CellKind::Line));
    assert!(volume.tags.is_none());
}

#[test]
fn test_default_problem_boundary_values() {
    let case = prepare(4, 0.1);
    let temperature = case.solve(&ThermalParams::default()).unwrap();
    let (length, width) = (case.mesh.length, case.mesh.width);
    let on = |a: f64, b: f64| (a - b).abs() < 1e-9;

    let mesh = temperature.mesh();
    let mut checked = [0usize; 3];
    for (node, &t) in mesh.nodes.iter().zip(temperature.values()) {
        if on(node.y, 0.0) {
            assert_relative_eq!(t, 25.0, epsilon = 1e-9);
            checked[0] += 1;
        } else if on(node.x, 0.0) {
            assert_relative_eq!(t, 50.0, epsilon = 1e-9);
            checked[1] += 1;
        } else if on(node.y, width) {
            assert_relative_eq!(t, 100.0, epsilon = 1e-9);
            checked[2] += 1;
        }
    }
    assert!(checked.iter().all(|&c| c > 0));
    // corner rule
    assert_relative_eq!(temperature.probe(0.0, width).unwrap(), 50.0, epsilon = 1e-9);
    assert_relative_eq!(temperature.probe(length, width).unwrap(), 100.0, epsilon = 1e-9);
    assert_relative_eq!(temperature.probe(0.0, 0.0).unwrap(), 25.0, epsilon = 1e-9);
    assert_relative_eq!(temperature.probe(length, 0.0).unwrap(), 25.0, epsilon = 1e-9);

    // maximum principle
    assert!(temperature.min().unwrap() >= 25.0 - 1e-9);
    assert!(temperature.max().unwrap() <= 100.0 + 1e-9);

    let (written, field) = read_nodal_field(&case.output("temperature.vtu"), TEMPERATURE_FIELD)
        .unwrap();
    assert_eq!(written.point_num(), mesh.node_num);
    for (a, b) in field.iter().zip(temperature.values()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_uniform_dirichlet_gives_uniform_field() {
    let case = prepare(3, 0.1);
    let params = ThermalParams {
        top_temp: 60.0,
        left_temp: 60.0,
        bottom_temp: 60.0,
        ..ThermalParams::default()
    };
    let temperature = case.solve(&params).unwrap();
    for &t in temperature.values() {
        assert_relative_eq!(t, 60.0, epsilon = 1e-9);
    }
}

#[test]
fn test_cg_agrees_with_lu() {
    let case = prepare(4, 0.1);
    let lu = case.solve(&ThermalParams::default()).unwrap();
    let mut params = ThermalParams::default();
    params.solver.linear_solver = LinearSolver::Cg;
    let cg = case.solve(&params).unwrap();
    for (a, b) in lu.values().iter().zip(cg.values()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
}

#[test]
fn test_cg_with_too_few_iterations_does_not_converge() {
    let case = prepare(4, 0.1);
    let mut params = ThermalParams::default();
    params.solver.linear_solver = LinearSolver::Cg;
    params.solver.max_iterations = 1;
    assert!(matches!(
        case.solve(&params),
        Err(Error::NotConverged { iterations: 1, .. })
    ));
}

#[test]
fn test_mesh_builder_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = mesh_params(&dir.path().join("a"), 4, 0.1);
    let second = mesh_params(&dir.path().join("b"), 4, 0.1);
    create_msh(&first).unwrap();
    create_msh(&second).unwrap();
    assert_eq!(
        fs::read(&first.mesh_file).unwrap(),
        fs::read(&second.mesh_file).unwrap()
    );
    assert_eq!(
        fs::read(&first.tags_file).unwrap(),
        fs::read(&second.tags_file).unwrap()
    );
}

#[test]
fn test_missing_top_edge_name_is_rejected() {
    let mut case = prepare(2, 0.1);
    let mut tags = TagDictionary::new();
    for (tag, name) in case.tags.iter().filter(|(_, name)| *name != "Top Edge") {
        tags.insert(tag, name);
    }
    case.tags = tags;
    assert!(matches!(
        case.solve(&ThermalParams::default()),
        Err(Error::UnknownBoundary(name)) if name == "Top Edge"
    ));
}

#[test]
fn test_compatibility_dictionary_matches_written_one() {
    let case = prepare(5, 0.1);
    assert_eq!(case.tags, TagDictionary::segmented_rectangle(5));
}

#[test]
fn test_boundary_from_another_mesh_is_a_mismatch() {
    let fine = prepare(4, 0.1);
    let coarse = prepare(4, 0.25);
    let result = solve_thermal_problem(
        &fine.volume_file,
        &coarse.boundary_file,
        &fine.output("temperature.vtu"),
        &fine.tags,
        &ThermalParams::default(),
    );
    assert!(matches!(result, Err(Error::BoundaryMismatch(_))));
}

#[test]
fn test_nodal_csv() {
    let case = prepare(2, 0.25);
    let temperature = case.solve(&ThermalParams::default()).unwrap();
    let csv_file = case.output("temperature.csv");
    write_nodal_csv(&csv_file, &temperature).unwrap();
    let text = fs::read_to_string(&csv_file).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("x,y,temperature"));
    assert_eq!(lines.count(), temperature.values().len());
}

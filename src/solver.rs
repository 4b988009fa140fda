use std::path::Path;

use log::{info, warn};
use ndarray::{Array1, array};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};

use crate::disc::{
    boundary::{BoundaryCondition, BoundaryMarkers},
    cg_basis::{CGBasis2D, triangle::TriangleCGBasis},
    geometric::Geometric2D,
    linear_elliptic::LinearElliptic,
    mesh::mesh2d::Mesh2d,
};
use crate::error::{Error, Result};
use crate::io::vtu::{read_cell_mesh, write_nodal_field};
use crate::tags::{LEFT_EDGE, RIGHT_EDGE, TOP_EDGE, TagDictionary, segment_name};

pub const TEMPERATURE_FIELD: &str = "temperature";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearSolver {
    /// Sparse LU factorization.
    #[default]
    Lu,
    /// Jacobi-preconditioned conjugate gradients.
    Cg,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParameters {
    pub linear_solver: LinearSolver,
    /// Relative residual target of the iterative solver.
    pub tolerance: f64,
    pub max_iterations: usize,
}
impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            linear_solver: LinearSolver::Lu,
            tolerance: 1e-10,
            max_iterations: 10000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    pub top_temp: f64,
    pub left_temp: f64,
    pub bottom_temp: f64,
    /// Heat flux into the domain through the right edge; zero keeps it insulated.
    pub right_heat_flux: f64,
    pub conductivity: f64,
    /// Uniform volumetric heat source.
    pub source: f64,
    #[serde(flatten)]
    pub solver: SolverParameters,
}
impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            top_temp: 100.0,
            left_temp: 50.0,
            bottom_temp: 25.0,
            right_heat_flux: 0.0,
            conductivity: 1.0,
            source: 0.0,
            solver: SolverParameters::default(),
        }
    }
}

impl ThermalParams {
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("top_temp", self.top_temp),
            ("left_temp", self.left_temp),
            ("bottom_temp", self.bottom_temp),
            ("right_heat_flux", self.right_heat_flux),
            ("source", self.source),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Config(format!("{name} must be finite, got {value}")));
        }
        if !(self.conductivity.is_finite() && self.conductivity > 0.0) {
            return Err(Error::Config(format!(
                "conductivity must be positive, got {}",
                self.conductivity
            )));
        }
        if self.solver.linear_solver == LinearSolver::Cg
            && !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0)
        {
            return Err(Error::Config(format!(
                "tolerance must be positive, got {}",
                self.solver.tolerance
            )));
        }
        Ok(())
    }
    /// Conditions keyed by physical tag, in application order: top, left, then
    /// every bottom segment, then the right edge.
    pub fn boundary_conditions(
        &self,
        tags: &TagDictionary,
    ) -> Result<Vec<(i32, BoundaryCondition)>> {
        let lookup = |name: &str| {
            tags.tag_of(name)
                .ok_or_else(|| Error::UnknownBoundary(name.to_string()))
        };
        let segments = tags.segment_tags();
        if segments.is_empty() {
            return Err(Error::UnknownBoundary(segment_name(1)));
        }
        let mut conditions = vec![
            (
                lookup(TOP_EDGE)?,
                BoundaryCondition::Dirichlet {
                    temperature: self.top_temp,
                },
            ),
            (
                lookup(LEFT_EDGE)?,
                BoundaryCondition::Dirichlet {
                    temperature: self.left_temp,
                },
            ),
        ];
        conditions.extend(segments.into_iter().map(|tag| {
            (
                tag,
                BoundaryCondition::Dirichlet {
                    temperature: self.bottom_temp,
                },
            )
        }));
        match tags.tag_of(RIGHT_EDGE) {
            Some(tag) => conditions.push((
                tag,
                BoundaryCondition::Neumann {
                    heat_flux: self.right_heat_flux,
                },
            )),
            None if self.right_heat_flux != 0.0 => {
                return Err(Error::UnknownBoundary(RIGHT_EDGE.to_string()));
            }
            None => {}
        }
        Ok(conditions)
    }
}

/// Nodal temperature field on the volume mesh.
#[derive(Clone, Debug)]
pub struct Temperature {
    mesh: Mesh2d,
    values: Array1<f64>,
}

impl Temperature {
    pub fn mesh(&self) -> &Mesh2d {
        &self.mesh
    }
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }
    pub fn min(&self) -> Option<f64> {
        self.values.min().ok().copied()
    }
    pub fn max(&self) -> Option<f64> {
        self.values.max().ok().copied()
    }
    /// Linear interpolation at `(x, y)`, `None` outside the mesh.
    pub fn probe(&self, x: f64, y: f64) -> Option<f64> {
        const INSIDE: f64 = -1e-12;
        (0..self.mesh.elem_num).find_map(|ielem| {
            let (xs, ys) = self.mesh.element_coords(ielem);
            let (r, s) = Mesh2d::map_to_reference(&xs, &ys, x, y);
            if r < INSIDE || s < INSIDE || 1.0 - r - s < INSIDE {
                return None;
            }
            let phi = TriangleCGBasis::shape_functions(array![r].view(), array![s].view());
            let inodes = self.mesh.elements[ielem].inodes;
            Some(
                (0..TriangleCGBasis::NUM_NODES)
                    .map(|i| phi[[0, i]] * self.values[inodes[i]])
                    .sum(),
            )
        })
    }
}

/// Solves the steady heat equation on a volume mesh with tagged boundary lines.
pub fn solve_on_mesh(
    mesh: Mesh2d,
    markers: &BoundaryMarkers,
    tags: &TagDictionary,
    params: &ThermalParams,
) -> Result<Temperature> {
    params.validate()?;
    let conditions = params.boundary_conditions(tags)?;
    let operator = LinearElliptic::new(params.conductivity, params.source);
    let mut system = operator.assemble(&mesh);

    for tag in markers.tags() {
        if conditions.iter().all(|(t, _)| *t != tag) {
            warn!(
                "facets with tag {tag} ({}) get no boundary condition",
                tags.name(tag).unwrap_or("unnamed")
            );
        }
    }

    let mut prescribed: Vec<Option<f64>> = vec![None; mesh.node_num];
    for (tag, condition) in &conditions {
        let name = tags.name(*tag).unwrap_or("unnamed");
        let edges = markers.edges_with_tag(*tag);
        if edges.is_empty() {
            warn!("no facets carry tag {tag} ({name})");
            continue;
        }
        match *condition {
            BoundaryCondition::Dirichlet { temperature } => {
                // later conditions overwrite shared corner nodes
                for inode in markers.nodes_with_tag(&mesh, *tag) {
                    prescribed[inode] = Some(temperature);
                }
            }
            BoundaryCondition::Neumann { heat_flux } => {
                operator.add_boundary_flux(&mut system, &mesh, &edges, heat_flux);
            }
        }
        info!("{name} (tag {tag}): {condition:?} on {} facets", edges.len());
    }
    if prescribed.iter().all(Option::is_none) {
        return Err(Error::BoundaryMismatch(
            "the mesh carries none of the Dirichlet boundary tags".into(),
        ));
    }
    system.apply_dirichlet(&prescribed);

    let values = match params.solver.linear_solver {
        LinearSolver::Lu => system.solve_lu()?,
        LinearSolver::Cg => {
            system.solve_pcg(params.solver.tolerance, params.solver.max_iterations)?
        }
    };
    Ok(Temperature { mesh, values })
}

pub fn solve_thermal_problem(
    volume_file: &Path,
    boundary_file: &Path,
    output_file: &Path,
    tags: &TagDictionary,
    params: &ThermalParams,
) -> Result<Temperature> {
    info!(
        "solving with {:?}: top={}, left={}, bottom={}",
        params.solver.linear_solver, params.top_temp, params.left_temp, params.bottom_temp
    );
    let volume = read_cell_mesh(volume_file)?;
    let lines = read_cell_mesh(boundary_file)?;
    let mesh = Mesh2d::from_cell_mesh(&volume)?;
    let markers = BoundaryMarkers::from_cell_mesh(&mesh, &lines)?;
    info!(
        "mesh: {} nodes, {} triangles, {} boundary edges",
        mesh.node_num,
        mesh.elem_num,
        mesh.boundary_edges.len()
    );

    let temperature = solve_on_mesh(mesh, &markers, tags, params)?;
    write_nodal_field(
        output_file,
        &temperature.mesh.to_cell_mesh(),
        TEMPERATURE_FIELD,
        temperature.values.view(),
    )?;
    if let (Some(min), Some(max)) = (temperature.min(), temperature.max()) {
        info!("temperature range [{min:.4}, {max:.4}]");
    }
    Ok(temperature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CellKind;
    use crate::io::vtu::CellMesh;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    // Unit square, 4 x 4 cells; bottom split into two segments at x = 0.5.
    // Tags: 1,2 segments, 3 right, 4 top, 5 left.
    fn tagged_square() -> (Mesh2d, BoundaryMarkers) {
        let mesh = Mesh2d::create_tri_mesh(4, 4, 0.0, 1.0, 0.0, 1.0).unwrap();
        let mut cells = Vec::new();
        let mut tags = Vec::new();
        for &iedge in &mesh.boundary_edges {
            let [n0, n1] = mesh.edges[iedge].inodes;
            let (a, b) = (&mesh.nodes[n0], &mesh.nodes[n1]);
            let (xm, ym) = (0.5 * (a.x + b.x), 0.5 * (a.y + b.y));
            let tag = if ym == 0.0 {
                if xm < 0.5 { 1 } else { 2 }
            } else if xm == 1.0 {
                3
            } else if ym == 1.0 {
                4
            } else {
                5
            };
            cells.extend([n0, n1]);
            tags.push(tag);
        }
        let lines = CellMesh {
            points: mesh.to_cell_mesh().points,
            kind: CellKind::Line,
            cells: Array2::from_shape_vec((tags.len(), 2), cells).unwrap(),
            tags: Some(Array1::from(tags)),
        };
        let markers = BoundaryMarkers::from_cell_mesh(&mesh, &lines).unwrap();
        (mesh, markers)
    }

    #[test]
    fn test_condition_order_and_names() {
        let tags = TagDictionary::segmented_rectangle(2);
        let conditions = ThermalParams::default().boundary_conditions(&tags).unwrap();
        let order: Vec<i32> = conditions.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(order, vec![4, 5, 1, 2, 3]);
        assert_eq!(
            conditions[0].1,
            BoundaryCondition::Dirichlet { temperature: 100.0 }
        );
        assert_eq!(conditions[4].1, BoundaryCondition::Neumann { heat_flux: 0.0 });
    }

    #[test]
    fn test_missing_top_edge_is_unknown_boundary() {
        let mut tags = TagDictionary::new();
        tags.insert(1, "Segment 1");
        tags.insert(2, "Left Edge");
        let err = ThermalParams::default().boundary_conditions(&tags).unwrap_err();
        assert!(matches!(err, Error::UnknownBoundary(name) if name == "Top Edge"));
    }

    #[test]
    fn test_default_problem_corner_rule() {
        let (mesh, markers) = tagged_square();
        let tags = TagDictionary::segmented_rectangle(2);
        let t = solve_on_mesh(mesh, &markers, &tags, &ThermalParams::default()).unwrap();
        let at = |x: f64, y: f64| t.probe(x, y).unwrap();
        assert_relative_eq!(at(0.5, 1.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(at(1.0, 1.0), 100.0, epsilon = 1e-9);
        // top-left corner belongs to the left edge
        assert_relative_eq!(at(0.0, 1.0), 50.0, epsilon = 1e-9);
        assert_relative_eq!(at(0.0, 0.5), 50.0, epsilon = 1e-9);
        // bottom corners belong to the bottom segments
        assert_relative_eq!(at(0.0, 0.0), 25.0, epsilon = 1e-9);
        assert_relative_eq!(at(1.0, 0.0), 25.0, epsilon = 1e-9);
        assert!(t.min().unwrap() >= 25.0 - 1e-9);
        assert!(t.max().unwrap() <= 100.0 + 1e-9);
    }

    #[test]
    fn test_uniform_boundary_gives_constant_field() {
        let (mesh, markers) = tagged_square();
        let tags = TagDictionary::segmented_rectangle(2);
        let params = ThermalParams {
            top_temp: 42.0,
            left_temp: 42.0,
            bottom_temp: 42.0,
            ..ThermalParams::default()
        };
        let t = solve_on_mesh(mesh, &markers, &tags, &params).unwrap();
        for &v in t.values() {
            assert_relative_eq!(v, 42.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cg_matches_lu() {
        let tags = TagDictionary::segmented_rectangle(2);
        let (mesh, markers) = tagged_square();
        let lu = solve_on_mesh(mesh.clone(), &markers, &tags, &ThermalParams::default()).unwrap();
        let mut params = ThermalParams::default();
        params.solver.linear_solver = LinearSolver::Cg;
        let cg = solve_on_mesh(mesh, &markers, &tags, &params).unwrap();
        for (a, b) in lu.values().iter().zip(cg.values()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_right_heat_flux_warms_the_right_edge() {
        let tags = TagDictionary::segmented_rectangle(2);
        let (mesh, markers) = tagged_square();
        let insulated =
            solve_on_mesh(mesh.clone(), &markers, &tags, &ThermalParams::default()).unwrap();
        let params = ThermalParams {
            right_heat_flux: 50.0,
            ..ThermalParams::default()
        };
        let heated = solve_on_mesh(mesh, &markers, &tags, &params).unwrap();
        let (a, b) = (
            insulated.probe(1.0, 0.5).unwrap(),
            heated.probe(1.0, 0.5).unwrap(),
        );
        assert!(b > a);
    }

    #[test]
    fn test_probe_outside_mesh() {
        let (mesh, markers) = tagged_square();
        let tags = TagDictionary::segmented_rectangle(2);
        let t = solve_on_mesh(mesh, &markers, &tags, &ThermalParams::default()).unwrap();
        assert!(t.probe(1.5, 0.5).is_none());
        assert!(t.probe(0.5, -0.1).is_none());
    }

    #[test]
    fn test_invalid_conductivity_is_a_config_error() {
        let (mesh, markers) = tagged_square();
        let tags = TagDictionary::segmented_rectangle(2);
        let params = ThermalParams {
            conductivity: 0.0,
            ..ThermalParams::default()
        };
        assert!(matches!(
            solve_on_mesh(mesh, &markers, &tags, &params),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_params_from_json_use_defaults() {
        let params: ThermalParams =
            serde_json::from_str(r#"{"top_temp": 10.0, "linear_solver": "cg"}"#).unwrap();
        assert_eq!(params.top_temp, 10.0);
        assert_eq!(params.left_temp, 50.0);
        assert_eq!(params.solver.linear_solver, LinearSolver::Cg);
        assert_eq!(params.solver.max_iterations, 10000);
    }
}

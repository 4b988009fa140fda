use hashbrown::HashMap;
use ndarray::Array2;

use crate::disc::geometric::Geometric2D;
use crate::error::{Error, Result};
use crate::io::CellKind;
use crate::io::vtu::CellMesh;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
}
#[derive(Clone, Debug)]
pub struct Edge {
    pub inodes: [usize; 2],
    pub parents: Vec<usize>,
}
impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.parents.len() == 1
    }
}
#[derive(Clone, Debug)]
pub struct TriangleElement {
    pub inodes: [usize; 3],
}

/// Unstructured triangle mesh with its unique edges and their parent elements.
#[derive(Clone, Debug)]
pub struct Mesh2d {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub elements: Vec<TriangleElement>,
    pub boundary_edges: Vec<usize>,
    pub elem_num: usize,
    pub node_num: usize,
    edge_map: HashMap<(usize, usize), usize>,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

impl Geometric2D for Mesh2d {}

impl Mesh2d {
    /// Builds the connectivity of a triangle cell mesh. Elements are
    /// renumbered counter-clockwise where needed.
    pub fn from_cell_mesh(mesh: &CellMesh) -> Result<Self> {
        if mesh.kind != CellKind::Triangle {
            return Err(Error::MissingCellBlock("triangle"));
        }
        let nodes: Vec<Node> = mesh
            .points
            .rows()
            .into_iter()
            .map(|p| Node { x: p[0], y: p[1] })
            .collect();
        let node_num = nodes.len();

        let mut elements = Vec::with_capacity(mesh.cell_num());
        for (ielem, cell) in mesh.cells.rows().into_iter().enumerate() {
            let mut inodes = [cell[0], cell[1], cell[2]];
            if inodes.iter().any(|&i| i >= node_num) {
                return Err(Error::Geometry(format!(
                    "element {ielem} references a missing node"
                )));
            }
            let x = inodes.map(|i| nodes[i].x);
            let y = inodes.map(|i| nodes[i].y);
            let signed_area = Self::compute_signed_area(&x, &y);
            if signed_area == 0.0 {
                return Err(Error::Geometry(format!("element {ielem} is degenerate")));
            }
            if signed_area < 0.0 {
                inodes.swap(1, 2);
            }
            elements.push(TriangleElement { inodes });
        }

        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();
        for (ielem, elem) in elements.iter().enumerate() {
            for k in 0..3 {
                let n0 = elem.inodes[k];
                let n1 = elem.inodes[(k + 1) % 3];
                let iedge = *edge_map.entry(edge_key(n0, n1)).or_insert_with(|| {
                    edges.push(Edge {
                        inodes: [n0, n1],
                        parents: Vec::new(),
                    });
                    edges.len() - 1
                });
                let edge = &mut edges[iedge];
                if edge.parents.len() == 2 {
                    return Err(Error::Geometry(format!(
                        "edge ({n0}, {n1}) is shared by more than two elements"
                    )));
                }
                edge.parents.push(ielem);
            }
        }
        let boundary_edges = edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.is_boundary())
            .map(|(iedge, _)| iedge)
            .collect();

        let elem_num = elements.len();
        Ok(Mesh2d {
            nodes,
            edges,
            elements,
            boundary_edges,
            elem_num,
            node_num,
            edge_map,
        })
    }
    /// Structured mesh of `[x0, x1] x [y0, y1]` with every cell split along its
    /// lower-left to upper-right diagonal.
    pub fn create_tri_mesh(
        x_num: usize,
        y_num: usize,
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
    ) -> Result<Self> {
        let dx = (x1 - x0) / x_num as f64;
        let dy = (y1 - y0) / y_num as f64;
        let node_id = |i: usize, j: usize| j * (x_num + 1) + i;
        let mut coords = Vec::with_capacity(2 * (x_num + 1) * (y_num + 1));
        for j in 0..=y_num {
            for i in 0..=x_num {
                coords.push(x0 + i as f64 * dx);
                coords.push(y0 + j as f64 * dy);
            }
        }
        let mut connectivity = Vec::with_capacity(6 * x_num * y_num);
        for j in 0..y_num {
            for i in 0..x_num {
                let (n00, n10) = (node_id(i, j), node_id(i + 1, j));
                let (n01, n11) = (node_id(i, j + 1), node_id(i + 1, j + 1));
                connectivity.extend([n00, n10, n11, n00, n11, n01]);
            }
        }
        let npoints = (x_num + 1) * (y_num + 1);
        let points = Array2::from_shape_vec((npoints, 2), coords)
            .map_err(|e| Error::Geometry(e.to_string()))?;
        let cells = Array2::from_shape_vec((2 * x_num * y_num, 3), connectivity)
            .map_err(|e| Error::Geometry(e.to_string()))?;
        Self::from_cell_mesh(&CellMesh {
            points,
            kind: CellKind::Triangle,
            cells,
            tags: None,
        })
    }
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_map.get(&edge_key(a, b)).copied()
    }
    pub fn element_coords(&self, ielem: usize) -> ([f64; 3], [f64; 3]) {
        let inodes = self.elements[ielem].inodes;
        (
            inodes.map(|i| self.nodes[i].x),
            inodes.map(|i| self.nodes[i].y),
        )
    }
    pub fn to_cell_mesh(&self) -> CellMesh {
        let points = Array2::from_shape_fn((self.node_num, 2), |(i, k)| {
            if k == 0 { self.nodes[i].x } else { self.nodes[i].y }
        });
        let cells = Array2::from_shape_fn((self.elem_num, 3), |(i, k)| {
            self.elements[i].inodes[k]
        });
        CellMesh {
            points,
            kind: CellKind::Triangle,
            cells,
            tags: None,
        }
    }
    pub fn boundary_nodes(&self) -> Vec<usize> {
        let mut inodes: Vec<usize> = self
            .boundary_edges
            .iter()
            .flat_map(|&iedge| self.edges[iedge].inodes)
            .collect();
        inodes.sort_unstable();
        inodes.dedup();
        inodes
    }
}

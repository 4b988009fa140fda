use std::collections::BTreeSet;

use log::{debug, warn};

use crate::disc::mesh::mesh2d::Mesh2d;
use crate::error::{Error, Result};
use crate::io::CellKind;
use crate::io::vtu::CellMesh;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryCondition {
    /// Prescribed temperature.
    Dirichlet { temperature: f64 },
    /// Heat flux into the domain, `k dT/dn`. Zero is an insulated wall.
    Neumann { heat_flux: f64 },
}

/// Physical tag of every mesh edge, `None` for unmarked edges.
#[derive(Clone, Debug)]
pub struct BoundaryMarkers {
    markers: Vec<Option<i32>>,
    interior_marked: usize,
}

impl BoundaryMarkers {
    /// Matches every tagged line of `lines` to an edge of `mesh`. Both meshes
    /// must share the same point set.
    pub fn from_cell_mesh(mesh: &Mesh2d, lines: &CellMesh) -> Result<Self> {
        if lines.kind != CellKind::Line {
            return Err(Error::MissingCellBlock("line"));
        }
        let tags = lines
            .tags
            .as_ref()
            .ok_or(Error::MissingPhysicalTags("line"))?;
        if lines.point_num() != mesh.node_num {
            return Err(Error::BoundaryMismatch(format!(
                "boundary mesh has {} points, volume mesh has {}",
                lines.point_num(),
                mesh.node_num
            )));
        }
        for (inode, p) in lines.points.rows().into_iter().enumerate() {
            let node = &mesh.nodes[inode];
            if p[0] != node.x || p[1] != node.y {
                return Err(Error::BoundaryMismatch(format!(
                    "point {inode} differs between boundary and volume meshes"
                )));
            }
        }

        let mut markers = vec![None; mesh.edges.len()];
        let mut interior_marked = 0;
        for (iline, (cell, &tag)) in lines.cells.rows().into_iter().zip(tags).enumerate() {
            let iedge = mesh.edge_between(cell[0], cell[1]).ok_or_else(|| {
                Error::BoundaryMismatch(format!(
                    "line {iline} ({}, {}) is not an edge of the volume mesh",
                    cell[0], cell[1]
                ))
            })?;
            if !mesh.edges[iedge].is_boundary() {
                warn!(
                    "line {iline} ({}, {}) with tag {tag} lies inside the volume mesh",
                    cell[0], cell[1]
                );
                interior_marked += 1;
            }
            markers[iedge] = Some(tag);
        }
        let marked = markers.iter().flatten().count();
        debug!("{marked} of {} edges carry a boundary tag", markers.len());
        Ok(Self {
            markers,
            interior_marked,
        })
    }
    pub fn tag(&self, iedge: usize) -> Option<i32> {
        self.markers[iedge]
    }
    /// Number of tagged lines that matched an interior edge.
    pub fn interior_marked(&self) -> usize {
        self.interior_marked
    }
    pub fn tags(&self) -> BTreeSet<i32> {
        self.markers.iter().flatten().copied().collect()
    }
    pub fn edges_with_tag(&self, tag: i32) -> Vec<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, marker)| **marker == Some(tag))
            .map(|(iedge, _)| iedge)
            .collect()
    }
    /// Sorted nodes lying on edges with the given tag.
    pub fn nodes_with_tag(&self, mesh: &Mesh2d, tag: i32) -> Vec<usize> {
        let mut inodes: Vec<usize> = self
            .edges_with_tag(tag)
            .into_iter()
            .flat_map(|iedge| mesh.edges[iedge].inodes)
            .collect();
        inodes.sort_unstable();
        inodes.dedup();
        inodes
    }
}

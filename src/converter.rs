use std::path::Path;

use log::info;
use ndarray::s;

use crate::error::{Error, Result};
use crate::io::CellKind;
use crate::io::msh::{MshMesh, read_msh};
use crate::io::vtu::{CellMesh, write_cell_mesh};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionSummary {
    pub point_num: usize,
    pub triangle_num: usize,
    pub line_num: usize,
}

/// Splits an MSH mesh into a triangle volume mesh and a tagged line mesh over
/// the same 2D points.
pub fn split_msh(mesh: &MshMesh) -> Result<(CellMesh, CellMesh)> {
    let points = mesh.points.slice(s![.., ..2]).to_owned();
    let triangles = mesh
        .cells(CellKind::Triangle)
        .ok_or(Error::MissingCellBlock("triangle"))?;
    let lines = mesh
        .cells(CellKind::Line)
        .ok_or(Error::MissingCellBlock("line"))?;
    let line_tags = mesh
        .physical_tags(CellKind::Line)
        .ok_or(Error::MissingPhysicalTags("line"))?;

    let volume = CellMesh {
        points: points.clone(),
        kind: CellKind::Triangle,
        cells: triangles,
        tags: None,
    };
    let boundary = CellMesh {
        points,
        kind: CellKind::Line,
        cells: lines,
        tags: Some(line_tags),
    };
    Ok((volume, boundary))
}

pub fn convert_mesh(
    mesh_file: &Path,
    volume_file: &Path,
    boundary_file: &Path,
) -> Result<ConversionSummary> {
    info!("converting {}", mesh_file.display());
    let msh = read_msh(mesh_file)?;
    let (volume, boundary) = split_msh(&msh)?;
    write_cell_mesh(volume_file, &volume)?;
    write_cell_mesh(boundary_file, &boundary)?;
    let summary = ConversionSummary {
        point_num: volume.point_num(),
        triangle_num: volume.cell_num(),
        line_num: boundary.cell_num(),
    };
    info!(
        "{} points, {} triangles, {} tagged lines",
        summary.point_num, summary.triangle_num, summary.line_num
    );
    Ok(summary)
}

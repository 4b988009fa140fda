use std::path::Path;

use log::info;
use ndarray::{Array1, Array2, ArrayView1};
use vtkio::{
    Vtk,
    model::{
        Attribute, Attributes, ByteOrder, CellType, Cells, DataArray, DataSet, ElementType,
        IOBuffer, Piece, UnstructuredGridPiece, Version, VertexNumbers,
    },
};

use crate::error::{Error, Result, ensure_parent_dir};
use crate::io::CellKind;

pub const TAGS_ARRAY: &str = "tags";

/// Points plus a single cell-type block, optionally with one integer tag per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellMesh {
    /// `n x 2` coordinates.
    pub points: Array2<f64>,
    pub kind: CellKind,
    /// `ncells x nodes_per_cell` point indices.
    pub cells: Array2<usize>,
    pub tags: Option<Array1<i32>>,
}

impl CellMesh {
    pub fn point_num(&self) -> usize {
        self.points.nrows()
    }
    pub fn cell_num(&self) -> usize {
        self.cells.nrows()
    }
}

fn vtk_cell_type(kind: CellKind) -> CellType {
    match kind {
        CellKind::Line => CellType::Line,
        CellKind::Triangle => CellType::Triangle,
    }
}

fn scalars(name: &str, data: IOBuffer) -> Attribute {
    Attribute::DataArray(DataArray {
        name: name.to_string(),
        elem: ElementType::Scalars {
            num_comp: 1,
            lookup_table: None,
        },
        data,
    })
}

fn export(path: &Path, mesh: &CellMesh, point_data: Vec<Attribute>, title: &str) -> Result<()> {
    let vtk_points: Vec<f64> = mesh
        .points
        .rows()
        .into_iter()
        .flat_map(|p| [p[0], p[1], 0.0])
        .collect();
    let npc = mesh.kind.nodes_per_cell();
    let connectivity: Vec<u64> = mesh.cells.iter().map(|&i| i as u64).collect();
    let offsets: Vec<u64> = (0..mesh.cell_num()).map(|i| ((i + 1) * npc) as u64).collect();
    let cell_data = match &mesh.tags {
        Some(tags) => vec![scalars(TAGS_ARRAY, IOBuffer::I32(tags.to_vec()))],
        None => vec![],
    };

    let vtk_file = Vtk {
        version: Version::XML { major: 1, minor: 0 },
        title: title.into(),
        byte_order: ByteOrder::native(),
        data: DataSet::inline(UnstructuredGridPiece {
            points: IOBuffer::F64(vtk_points),
            cells: Cells {
                cell_verts: VertexNumbers::XML {
                    connectivity,
                    offsets,
                },
                types: vec![vtk_cell_type(mesh.kind); mesh.cell_num()],
            },
            data: Attributes {
                point: point_data,
                cell: cell_data,
            },
        }),
        file_path: None,
    };
    ensure_parent_dir(path)?;
    vtk_file
        .export(path)
        .map_err(|e| Error::vtu(path, format!("{e:?}")))?;
    info!("wrote {}", path.display());
    Ok(())
}

pub fn write_cell_mesh(path: &Path, mesh: &CellMesh) -> Result<()> {
    export(path, mesh, vec![], "Mesh")
}

/// Writes a triangle mesh with one scalar value per point.
pub fn write_nodal_field(
    path: &Path,
    mesh: &CellMesh,
    name: &str,
    values: ArrayView1<f64>,
) -> Result<()> {
    if values.len() != mesh.point_num() {
        return Err(Error::vtu(
            path,
            format!(
                "field `{name}` has {} values for {} points",
                values.len(),
                mesh.point_num()
            ),
        ));
    }
    let field = scalars(name, IOBuffer::F64(values.to_vec()));
    export(path, mesh, vec![field], "Solution Point Data")
}

fn import_piece(path: &Path) -> Result<UnstructuredGridPiece> {
    let vtk = Vtk::import(path).map_err(|e| Error::vtu(path, format!("{e:?}")))?;
    let DataSet::UnstructuredGrid { pieces, .. } = vtk.data else {
        return Err(Error::vtu(path, "not an unstructured grid"));
    };
    match pieces.into_iter().next() {
        Some(Piece::Inline(piece)) => Ok(*piece),
        Some(_) => Err(Error::vtu(path, "only inline pieces are supported")),
        None => Err(Error::vtu(path, "file contains no piece")),
    }
}

fn buffer_to_f64(path: &Path, buffer: IOBuffer, what: &str) -> Result<Vec<f64>> {
    match buffer {
        IOBuffer::F64(v) => Ok(v),
        IOBuffer::F32(v) => Ok(v.into_iter().map(f64::from).collect()),
        _ => Err(Error::vtu(path, format!("{what} must be floating point"))),
    }
}

fn buffer_to_i32(path: &Path, buffer: IOBuffer, what: &str) -> Result<Vec<i32>> {
    let out_of_range = || Error::vtu(path, format!("{what} out of i32 range"));
    match buffer {
        IOBuffer::I32(v) => Ok(v),
        IOBuffer::I64(v) => v
            .into_iter()
            .map(|x| i32::try_from(x).map_err(|_| out_of_range()))
            .collect(),
        IOBuffer::U32(v) => v
            .into_iter()
            .map(|x| i32::try_from(x).map_err(|_| out_of_range()))
            .collect(),
        IOBuffer::U64(v) => v
            .into_iter()
            .map(|x| i32::try_from(x).map_err(|_| out_of_range()))
            .collect(),
        _ => Err(Error::vtu(path, format!("{what} must be integer"))),
    }
}

fn split_piece(path: &Path, piece: UnstructuredGridPiece) -> Result<(CellMesh, Attributes)> {
    let coords = buffer_to_f64(path, piece.points, "points")?;
    if coords.len() % 3 != 0 {
        return Err(Error::vtu(path, "point buffer is not a multiple of 3"));
    }
    let npoints = coords.len() / 3;
    let flat_xy: Vec<f64> = coords.chunks_exact(3).flat_map(|p| [p[0], p[1]]).collect();
    let points = Array2::from_shape_vec((npoints, 2), flat_xy)
        .map_err(|e| Error::vtu(path, e.to_string()))?;

    let types = piece.cells.types;
    let kind = match types.first() {
        Some(CellType::Line) => CellKind::Line,
        Some(CellType::Triangle) => CellKind::Triangle,
        Some(other) => return Err(Error::vtu(path, format!("unsupported cell type {other:?}"))),
        None => return Err(Error::vtu(path, "file contains no cells")),
    };
    if types.iter().any(|t| *t != vtk_cell_type(kind)) {
        return Err(Error::vtu(path, "mixed cell types are not supported"));
    }
    let npc = kind.nodes_per_cell();
    let connectivity: Vec<usize> = match piece.cells.cell_verts {
        VertexNumbers::XML {
            connectivity,
            offsets,
        } => {
            let expected: Vec<u64> = (1..=types.len()).map(|i| (i * npc) as u64).collect();
            if offsets != expected {
                return Err(Error::vtu(path, "cell offsets do not match the cell type"));
            }
            connectivity.into_iter().map(|i| i as usize).collect()
        }
        VertexNumbers::Legacy { vertices, .. } => {
            let mut flat = Vec::with_capacity(types.len() * npc);
            for cell in vertices.chunks(npc + 1) {
                if cell.len() != npc + 1 || cell[0] as usize != npc {
                    return Err(Error::vtu(path, "cell size does not match the cell type"));
                }
                flat.extend(cell[1..].iter().map(|&i| i as usize));
            }
            flat
        }
    };
    if connectivity.iter().any(|&i| i >= npoints) {
        return Err(Error::vtu(path, "cell references a missing point"));
    }
    let cells = Array2::from_shape_vec((types.len(), npc), connectivity)
        .map_err(|e| Error::vtu(path, e.to_string()))?;
    let mesh = CellMesh {
        points,
        kind,
        cells,
        tags: None,
    };
    Ok((mesh, piece.data))
}

fn take_array(attributes: Vec<Attribute>, name: &str) -> Option<IOBuffer> {
    attributes.into_iter().find_map(|a| match a {
        Attribute::DataArray(array) if array.name == name => Some(array.data),
        _ => None,
    })
}

pub fn read_cell_mesh(path: &Path) -> Result<CellMesh> {
    let piece = import_piece(path)?;
    let (mut mesh, data) = split_piece(path, piece)?;
    if let Some(buffer) = take_array(data.cell, TAGS_ARRAY) {
        let tags = buffer_to_i32(path, buffer, "cell tags")?;
        if tags.len() != mesh.cell_num() {
            return Err(Error::vtu(path, "tag count does not match cell count"));
        }
        mesh.tags = Some(Array1::from(tags));
    }
    Ok(mesh)
}

pub fn read_nodal_field(path: &Path, name: &str) -> Result<(CellMesh, Array1<f64>)> {
    let piece = import_piece(path)?;
    let (mesh, data) = split_piece(path, piece)?;
    let buffer = take_array(data.point, name)
        .ok_or_else(|| Error::vtu(path, format!("no point data named `{name}`")))?;
    let values = buffer_to_f64(path, buffer, name)?;
    if values.len() != mesh.point_num() {
        return Err(Error::vtu(path, "point data length does not match point count"));
    }
    Ok((mesh, Array1::from(values)))
}

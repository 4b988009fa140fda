pub mod msh;
pub mod vtu;
pub mod write_to_csv;

/// Cell types exchanged between the mesh builder, converter and solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    Line,
    Triangle,
}
impl CellKind {
    pub fn nodes_per_cell(self) -> usize {
        match self {
            CellKind::Line => 2,
            CellKind::Triangle => 3,
        }
    }
    /// gmsh element type number.
    pub fn msh_type(self) -> usize {
        match self {
            CellKind::Line => 1,
            CellKind::Triangle => 2,
        }
    }
    pub fn from_msh_type(elem_type: usize) -> Option<Self> {
        match elem_type {
            1 => Some(CellKind::Line),
            2 => Some(CellKind::Triangle),
            _ => None,
        }
    }
}

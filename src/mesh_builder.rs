use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::session::GeoSession;
use crate::io::CellKind;
use crate::io::msh::write_msh;
use crate::tags::{LEFT_EDGE, RIGHT_EDGE, SURFACE, TOP_EDGE, TagDictionary, segment_name};

pub const MODEL_NAME: &str = "Parameterized Square with Segmented Bottom Edge";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    pub length: f64,
    pub width: f64,
    /// Number of pieces the bottom edge is cut into.
    pub num_segments: usize,
    /// Target element edge length.
    pub mesh_size: f64,
    pub mesh_file: PathBuf,
    pub tags_file: PathBuf,
}
impl Default for MeshParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            width: 0.5,
            num_segments: 4,
            mesh_size: 0.1,
            mesh_file: PathBuf::from("mesh/square_mesh.msh"),
            tags_file: PathBuf::from("mesh/tags.json"),
        }
    }
}

/// Builds the `length x width` rectangle with its bottom edge split into
/// `num_segments` equal lines, names every boundary line, and writes the tag
/// dictionary and the MSH mesh. Returns the dictionary that was written.
pub fn create_msh(params: &MeshParams) -> Result<TagDictionary> {
    info!(
        "building {} x {} rectangle, {} bottom segments, mesh size {}",
        params.length, params.width, params.num_segments, params.mesh_size
    );
    let mut session = GeoSession::initialize();
    let model = session.add_model(MODEL_NAME);
    let n = params.num_segments;
    let h = params.mesh_size;

    let bottom_points = (0..=n)
        .map(|i| model.add_point(i as f64 * (params.length / n as f64), 0.0, 0.0, h))
        .collect::<Result<Vec<i32>>>()?;
    let first = bottom_points[0];
    let last = bottom_points[bottom_points.len() - 1];
    let p_top_right = model.add_point(params.length, params.width, 0.0, h)?;
    let p_top_left = model.add_point(0.0, params.width, 0.0, h)?;

    let bottom_lines = bottom_points
        .windows(2)
        .map(|pair| model.add_line(pair[0], pair[1]))
        .collect::<Result<Vec<i32>>>()?;
    let right_line = model.add_line(last, p_top_right)?;
    let top_line = model.add_line(p_top_right, p_top_left)?;
    let left_line = model.add_line(p_top_left, first)?;

    let mut all_lines = bottom_lines.clone();
    all_lines.extend([right_line, top_line, left_line]);
    let curve_loop = model.add_curve_loop(&all_lines)?;
    let surface = model.add_plane_surface(&[curve_loop])?;

    let mut tags = TagDictionary::new();
    for (i, &line) in bottom_lines.iter().enumerate() {
        let tag = i as i32 + 1;
        model.add_physical_group(1, &[line], tag)?;
        model.set_physical_name(1, tag, &segment_name(i + 1))?;
        tags.insert(tag, segment_name(i + 1));
    }
    let n = n as i32;
    for (line, tag, name) in [
        (right_line, n + 1, RIGHT_EDGE),
        (top_line, n + 2, TOP_EDGE),
        (left_line, n + 3, LEFT_EDGE),
    ] {
        model.add_physical_group(1, &[line], tag)?;
        model.set_physical_name(1, tag, name)?;
        tags.insert(tag, name);
    }
    tags.write(&params.tags_file)?;

    model.add_physical_group(2, &[surface], 1)?;
    model.set_physical_name(2, 1, SURFACE)?;

    let mesh = model.generate(2)?;
    info!(
        "generated {} nodes, {} triangles, {} boundary lines",
        mesh.nodes.len(),
        mesh.element_count(CellKind::Triangle),
        mesh.element_count(CellKind::Line)
    );
    write_msh(&params.mesh_file, &mesh, model)?;
    Ok(tags)
}

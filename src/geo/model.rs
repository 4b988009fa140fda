use log::debug;

use crate::error::{Error, Result};
use crate::geo::mesher::{GeneratedMesh, transfinite_triangulation};

#[derive(Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub mesh_size: f64,
}
#[derive(Clone, Debug, PartialEq)]
pub struct GeoLine {
    pub id: i32,
    pub start: i32,
    pub end: i32,
}
#[derive(Clone, Debug, PartialEq)]
pub struct CurveLoop {
    pub id: i32,
    pub lines: Vec<i32>,
}
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneSurface {
    pub id: i32,
    pub loops: Vec<i32>,
}
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalGroup {
    pub dim: usize,
    pub tag: i32,
    pub entities: Vec<i32>,
    pub name: String,
}

/// Built-in geometry: points, straight lines, curve loops and plane surfaces.
/// Entity ids start at 1 and are assigned sequentially per kind.
#[derive(Clone, Debug)]
pub struct GeoModel {
    name: String,
    pub points: Vec<GeoPoint>,
    pub lines: Vec<GeoLine>,
    pub loops: Vec<CurveLoop>,
    pub surfaces: Vec<PlaneSurface>,
    pub physical_groups: Vec<PhysicalGroup>,
}

impl GeoModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            points: Vec::new(),
            lines: Vec::new(),
            loops: Vec::new(),
            surfaces: Vec::new(),
            physical_groups: Vec::new(),
        }
    }
    pub fn add_point(&mut self, x: f64, y: f64, z: f64, mesh_size: f64) -> Result<i32> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(Error::Geometry(format!(
                "point coordinates must be finite, got ({x}, {y}, {z})"
            )));
        }
        if !(mesh_size.is_finite() && mesh_size > 0.0) {
            return Err(Error::Geometry(format!(
                "mesh size must be positive, got {mesh_size}"
            )));
        }
        let id = self.points.len() as i32 + 1;
        self.points.push(GeoPoint {
            id,
            x,
            y,
            z,
            mesh_size,
        });
        Ok(id)
    }
    pub fn add_line(&mut self, start: i32, end: i32) -> Result<i32> {
        let p0 = self.point(start)?;
        let p1 = self.point(end)?;
        if start == end || (p0.x == p1.x && p0.y == p1.y && p0.z == p1.z) {
            return Err(Error::Geometry(format!(
                "line from point {start} to point {end} has zero length"
            )));
        }
        let id = self.lines.len() as i32 + 1;
        self.lines.push(GeoLine { id, start, end });
        Ok(id)
    }
    /// The lines must chain end-to-start and close on the first one.
    pub fn add_curve_loop(&mut self, lines: &[i32]) -> Result<i32> {
        if lines.is_empty() {
            return Err(Error::Geometry("curve loop needs at least one line".into()));
        }
        for (k, &iline) in lines.iter().enumerate() {
            let current = self.line(iline)?;
            let next = self.line(lines[(k + 1) % lines.len()])?;
            if current.end != next.start {
                return Err(Error::Geometry(format!(
                    "curve loop is not closed: line {} ends at point {} but line {} starts at point {}",
                    current.id, current.end, next.id, next.start
                )));
            }
        }
        let id = self.loops.len() as i32 + 1;
        self.loops.push(CurveLoop {
            id,
            lines: lines.to_vec(),
        });
        Ok(id)
    }
    pub fn add_plane_surface(&mut self, loops: &[i32]) -> Result<i32> {
        if loops.is_empty() {
            return Err(Error::Geometry("plane surface needs a curve loop".into()));
        }
        for &iloop in loops {
            self.curve_loop(iloop)?;
        }
        let id = self.surfaces.len() as i32 + 1;
        self.surfaces.push(PlaneSurface {
            id,
            loops: loops.to_vec(),
        });
        Ok(id)
    }
    pub fn add_physical_group(&mut self, dim: usize, entities: &[i32], tag: i32) -> Result<i32> {
        for &entity in entities {
            if !self.entity_exists(dim, entity) {
                return Err(Error::Geometry(format!(
                    "physical group {tag}: no entity ({dim}, {entity})"
                )));
            }
        }
        if self.physical_group(dim, tag).is_some() {
            return Err(Error::Geometry(format!(
                "physical group ({dim}, {tag}) already exists"
            )));
        }
        self.physical_groups.push(PhysicalGroup {
            dim,
            tag,
            entities: entities.to_vec(),
            name: String::new(),
        });
        Ok(tag)
    }
    pub fn set_physical_name(&mut self, dim: usize, tag: i32, name: &str) -> Result<()> {
        let group = self
            .physical_groups
            .iter_mut()
            .find(|g| g.dim == dim && g.tag == tag)
            .ok_or_else(|| Error::Geometry(format!("no physical group ({dim}, {tag})")))?;
        group.name = name.to_string();
        Ok(())
    }
    /// Meshes every plane surface of the model. Only 2D meshing is available.
    pub fn generate(&self, dim: usize) -> Result<GeneratedMesh> {
        if dim != 2 {
            return Err(Error::Geometry(format!(
                "only 2D meshing is supported, requested dimension {dim}"
            )));
        }
        let surface = match self.surfaces.as_slice() {
            [surface] => surface,
            [] => return Err(Error::Geometry("model has no surface to mesh".into())),
            _ => {
                return Err(Error::Geometry(
                    "unsupported geometry: more than one plane surface".into(),
                ));
            }
        };
        let mesh = transfinite_triangulation(self, surface.id)?;
        debug!(
            "model `{}`: {} nodes, {} element blocks",
            self.name,
            mesh.nodes.len(),
            mesh.blocks.len()
        );
        Ok(mesh)
    }

    pub fn point(&self, id: i32) -> Result<&GeoPoint> {
        lookup(&self.points, id).ok_or_else(|| Error::Geometry(format!("no point {id}")))
    }
    pub fn line(&self, id: i32) -> Result<&GeoLine> {
        lookup(&self.lines, id).ok_or_else(|| Error::Geometry(format!("no line {id}")))
    }
    pub fn curve_loop(&self, id: i32) -> Result<&CurveLoop> {
        lookup(&self.loops, id).ok_or_else(|| Error::Geometry(format!("no curve loop {id}")))
    }
    pub fn surface(&self, id: i32) -> Result<&PlaneSurface> {
        lookup(&self.surfaces, id).ok_or_else(|| Error::Geometry(format!("no surface {id}")))
    }
    pub fn physical_group(&self, dim: usize, tag: i32) -> Option<&PhysicalGroup> {
        self.physical_groups
            .iter()
            .find(|g| g.dim == dim && g.tag == tag)
    }
    /// Physical tags the entity `(dim, id)` belongs to.
    pub fn physical_tags_of(&self, dim: usize, id: i32) -> Vec<i32> {
        self.physical_groups
            .iter()
            .filter(|g| g.dim == dim && g.entities.contains(&id))
            .map(|g| g.tag)
            .collect()
    }
    fn entity_exists(&self, dim: usize, id: i32) -> bool {
        match dim {
            0 => self.point(id).is_ok(),
            1 => self.line(id).is_ok(),
            2 => self.surface(id).is_ok(),
            _ => false,
        }
    }
}

fn lookup<T>(entities: &[T], id: i32) -> Option<&T> {
    if id < 1 {
        return None;
    }
    entities.get(id as usize - 1)
}

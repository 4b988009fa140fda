use hashbrown::HashMap;
use log::debug;

use crate::error::{Error, Result};
use crate::geo::model::{GeoLine, GeoModel, GeoPoint};
use crate::io::CellKind;

/// Geometric entity `(dim, tag)` a mesh node or element belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub dim: usize,
    pub tag: i32,
}
#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub entity: EntityRef,
}
#[derive(Clone, Debug, PartialEq)]
pub struct ElementBlock {
    pub entity: EntityRef,
    pub kind: CellKind,
    /// 0-based node indices.
    pub cells: Vec<Vec<usize>>,
}
/// Mesh produced by the geometry kernel. Nodes are ordered by owning entity:
/// geometry points, then curve interiors, then the surface interior.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedMesh {
    pub nodes: Vec<MeshNode>,
    pub blocks: Vec<ElementBlock>,
}
impl GeneratedMesh {
    pub fn element_count(&self, kind: CellKind) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.kind == kind)
            .map(|b| b.cells.len())
            .sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Side {
    Bottom,
    Right,
    Top,
    Left,
}

/// Number of equal intervals of at most `size` covering `length`.
pub(crate) fn interval_count(length: f64, size: f64) -> usize {
    // quotients like 0.5 / 0.1 land a hair above the integer
    ((length / size) - 1e-9).ceil().max(1.0) as usize
}

fn unsupported(what: &str) -> Error {
    Error::Geometry(format!("unsupported geometry for transfinite meshing: {what}"))
}

fn grid_index(values: &[f64], v: f64, eps: f64) -> Option<usize> {
    values.iter().position(|&c| (c - v).abs() <= eps)
}

fn sorted_breakpoints(mut values: Vec<f64>, eps: f64) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup_by(|a, b| (*a - *b).abs() <= eps);
    values
}

/// Structured triangulation of a plane surface bounded by an axis-aligned
/// rectangle. Bottom and right curves set the node distribution; top and left
/// curves must end on the resulting grid lines.
pub fn transfinite_triangulation(model: &GeoModel, surface_id: i32) -> Result<GeneratedMesh> {
    let surface = model.surface(surface_id)?;
    let [iloop] = surface.loops.as_slice() else {
        return Err(unsupported("surface with holes"));
    };
    let curve_loop = model.curve_loop(*iloop)?;
    let lines: Vec<&GeoLine> = curve_loop
        .lines
        .iter()
        .map(|&id| model.line(id))
        .collect::<Result<_>>()?;
    // The loop is closed, so the start points visit every corner once.
    let points: Vec<&GeoPoint> = lines
        .iter()
        .map(|line| model.point(line.start))
        .collect::<Result<_>>()?;

    let z0 = points[0].z;
    if points.iter().any(|p| p.z != z0) {
        return Err(unsupported("non-planar curve loop"));
    }
    let xmin = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let xmax = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let ymin = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let ymax = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    if !(xmax > xmin && ymax > ymin) {
        return Err(Error::Geometry("surface has zero area".into()));
    }
    let eps = 1e-10 * (xmax - xmin).max(ymax - ymin);

    let mut sides = Vec::with_capacity(lines.len());
    for line in lines.iter() {
        let p0 = model.point(line.start)?;
        let p1 = model.point(line.end)?;
        let on = |a: f64, b: f64, v: f64| (a - v).abs() <= eps && (b - v).abs() <= eps;
        let side = if on(p0.y, p1.y, ymin) {
            Side::Bottom
        } else if on(p0.x, p1.x, xmax) {
            Side::Right
        } else if on(p0.y, p1.y, ymax) {
            Side::Top
        } else if on(p0.x, p1.x, xmin) {
            Side::Left
        } else {
            return Err(unsupported(&format!(
                "line {} is not on the bounding rectangle",
                line.id
            )));
        };
        sides.push(side);
    }

    let mut xs = vec![xmin, xmax];
    let mut ys = vec![ymin, ymax];
    for (line, side) in lines.iter().zip(&sides) {
        let p0 = model.point(line.start)?;
        let p1 = model.point(line.end)?;
        let (a, b, breakpoints) = match side {
            Side::Bottom => (p0.x, p1.x, &mut xs),
            Side::Right => (p0.y, p1.y, &mut ys),
            Side::Top | Side::Left => continue,
        };
        let n = interval_count((b - a).abs(), p0.mesh_size.min(p1.mesh_size));
        breakpoints.push(a);
        breakpoints.push(b);
        for k in 1..n {
            breakpoints.push(a + (b - a) * k as f64 / n as f64);
        }
    }
    let xs = sorted_breakpoints(xs, eps);
    let ys = sorted_breakpoints(ys, eps);
    let nx = xs.len() - 1;
    let ny = ys.len() - 1;
    let grid = |i: usize, j: usize| j * (nx + 1) + i;

    let mut owner: Vec<Option<EntityRef>> = vec![None; (nx + 1) * (ny + 1)];
    let mut point_at: HashMap<i32, (usize, usize)> = HashMap::new();
    for p in points.iter() {
        let (Some(i), Some(j)) = (grid_index(&xs, p.x, eps), grid_index(&ys, p.y, eps)) else {
            return Err(unsupported(&format!(
                "point {} does not fall on the node distribution of the opposite side",
                p.id
            )));
        };
        if owner[grid(i, j)].is_some() {
            return Err(Error::Geometry(format!("point {} coincides with another point", p.id)));
        }
        owner[grid(i, j)] = Some(EntityRef { dim: 0, tag: p.id });
        point_at.insert(p.id, (i, j));
    }

    // Grid positions visited by each line, from its start point to its end point.
    let mut line_nodes: HashMap<i32, Vec<usize>> = HashMap::new();
    let mut boundary_steps = 0;
    for line in lines.iter() {
        let (ia, ja) = point_at[&line.start];
        let (ib, jb) = point_at[&line.end];
        let run: Vec<(usize, usize)> = if ja == jb {
            step_range(ia, ib).map(|i| (i, ja)).collect()
        } else if ia == ib {
            step_range(ja, jb).map(|j| (ia, j)).collect()
        } else {
            return Err(unsupported(&format!("line {} is not axis-aligned", line.id)));
        };
        boundary_steps += run.len() - 1;
        for &(i, j) in &run[1..run.len() - 1] {
            if owner[grid(i, j)].is_some() {
                return Err(Error::Geometry(format!("line {} overlaps another curve", line.id)));
            }
            owner[grid(i, j)] = Some(EntityRef { dim: 1, tag: line.id });
        }
        line_nodes.insert(line.id, run.iter().map(|&(i, j)| grid(i, j)).collect());
    }
    if boundary_steps != 2 * (nx + ny) {
        return Err(unsupported("curve loop does not cover the rectangle boundary"));
    }
    let surface_ref = EntityRef {
        dim: 2,
        tag: surface.id,
    };
    for slot in owner.iter_mut() {
        if slot.is_none() {
            *slot = Some(surface_ref);
        }
    }

    // Renumber grid positions by owning entity.
    let mut point_ids: Vec<i32> = points.iter().map(|p| p.id).collect();
    point_ids.sort_unstable();
    let mut line_ids: Vec<i32> = lines.iter().map(|l| l.id).collect();
    line_ids.sort_unstable();
    let mut order = Vec::with_capacity(owner.len());
    for id in &point_ids {
        let (i, j) = point_at[id];
        order.push(grid(i, j));
    }
    for id in &line_ids {
        let run = &line_nodes[id];
        order.extend_from_slice(&run[1..run.len() - 1]);
    }
    for j in 1..ny {
        for i in 1..nx {
            order.push(grid(i, j));
        }
    }
    let mut renumber = vec![0; owner.len()];
    for (new, &old) in order.iter().enumerate() {
        renumber[old] = new;
    }

    let mut nodes = Vec::with_capacity(order.len());
    for &old in &order {
        let (i, j) = (old % (nx + 1), old / (nx + 1));
        let Some(entity) = owner[old] else {
            return Err(Error::Geometry("mesh node without owning entity".into()));
        };
        let (x, y) = if entity.dim == 0 {
            let p = model.point(entity.tag)?;
            (p.x, p.y)
        } else {
            (xs[i], ys[j])
        };
        nodes.push(MeshNode { x, y, z: z0, entity });
    }

    let mut blocks = Vec::with_capacity(line_ids.len() + 1);
    for id in &line_ids {
        let cells = line_nodes[id]
            .windows(2)
            .map(|w| vec![renumber[w[0]], renumber[w[1]]])
            .collect();
        blocks.push(ElementBlock {
            entity: EntityRef { dim: 1, tag: *id },
            kind: CellKind::Line,
            cells,
        });
    }
    let mut triangles = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let n00 = renumber[grid(i, j)];
            let n10 = renumber[grid(i + 1, j)];
            let n11 = renumber[grid(i + 1, j + 1)];
            let n01 = renumber[grid(i, j + 1)];
            triangles.push(vec![n00, n10, n11]);
            triangles.push(vec![n00, n11, n01]);
        }
    }
    blocks.push(ElementBlock {
        entity: surface_ref,
        kind: CellKind::Triangle,
        cells: triangles,
    });
    debug!(
        "transfinite surface {}: {} x {} grid, {} nodes",
        surface.id,
        nx,
        ny,
        nodes.len()
    );
    Ok(GeneratedMesh { nodes, blocks })
}

fn step_range(a: usize, b: usize) -> Box<dyn Iterator<Item = usize>> {
    if a <= b {
        Box::new(a..=b)
    } else {
        Box::new((b..=a).rev())
    }
}

//! gmsh MSH 4.1 ASCII files: writer for generated meshes, nom-based reader.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use log::{debug, info};
use ndarray::{Array1, Array2};
use nom::{
    IResult,
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1, space0, space1},
    combinator::{opt, recognize},
    error::{Error as NomError, ErrorKind},
    multi::count,
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::error::{Error, Result, ensure_parent_dir};
use crate::geo::mesher::{EntityRef, GeneratedMesh};
use crate::geo::model::GeoModel;
use crate::io::CellKind;

#[derive(Clone, Debug, PartialEq)]
pub struct MshCellBlock {
    pub entity: EntityRef,
    pub kind: CellKind,
    /// 0-based indices into `MshMesh::points`.
    pub cells: Vec<Vec<usize>>,
    /// First physical tag of the owning entity.
    pub physical: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MshMesh {
    /// `n x 3` coordinates.
    pub points: Array2<f64>,
    pub blocks: Vec<MshCellBlock>,
    pub physical_names: Vec<(usize, i32, String)>,
}

impl MshMesh {
    /// All cells of `kind`, concatenated over blocks; `None` without such a block.
    pub fn cells(&self, kind: CellKind) -> Option<Array2<usize>> {
        let blocks: Vec<&MshCellBlock> = self.blocks.iter().filter(|b| b.kind == kind).collect();
        if blocks.is_empty() {
            return None;
        }
        let flat: Vec<usize> = blocks
            .iter()
            .flat_map(|b| b.cells.iter().flatten().copied())
            .collect();
        let ncells = flat.len() / kind.nodes_per_cell();
        Array2::from_shape_vec((ncells, kind.nodes_per_cell()), flat).ok()
    }
    /// Per-cell physical tags of `kind`, `None` if any block of that kind has none.
    pub fn physical_tags(&self, kind: CellKind) -> Option<Array1<i32>> {
        let mut tags = Vec::new();
        let mut found = false;
        for block in self.blocks.iter().filter(|b| b.kind == kind) {
            let physical = block.physical?;
            tags.extend(std::iter::repeat_n(physical, block.cells.len()));
            found = true;
        }
        found.then(|| Array1::from(tags))
    }
    pub fn cell_count(&self, kind: CellKind) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.kind == kind)
            .map(|b| b.cells.len())
            .sum()
    }
}

pub fn write_msh(path: &Path, mesh: &GeneratedMesh, model: &GeoModel) -> Result<()> {
    let mut out = String::new();
    write_msh_string(&mut out, mesh, model).map_err(|e| {
        Error::msh(&path.display().to_string(), format!("formatting failed: {e}"))
    })?;
    ensure_parent_dir(path)?;
    fs::write(path, out).map_err(|e| Error::io(path, e))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn write_msh_string(out: &mut String, mesh: &GeneratedMesh, model: &GeoModel) -> std::fmt::Result {
    writeln!(out, "$MeshFormat\n4.1 0 8\n$EndMeshFormat")?;

    let mut groups: Vec<_> = model
        .physical_groups
        .iter()
        .filter(|g| !g.name.is_empty())
        .collect();
    groups.sort_by_key(|g| (g.dim, g.tag));
    writeln!(out, "$PhysicalNames\n{}", groups.len())?;
    for group in &groups {
        writeln!(out, "{} {} \"{}\"", group.dim, group.tag, group.name)?;
    }
    writeln!(out, "$EndPhysicalNames")?;

    writeln!(out, "$Entities")?;
    writeln!(
        out,
        "{} {} {} 0",
        model.points.len(),
        model.lines.len(),
        model.surfaces.len()
    )?;
    for p in &model.points {
        write!(out, "{} {} {} {}", p.id, p.x, p.y, p.z)?;
        write_tag_list(out, &model.physical_tags_of(0, p.id))?;
        writeln!(out)?;
    }
    for line in &model.lines {
        let (Ok(p0), Ok(p1)) = (model.point(line.start), model.point(line.end)) else {
            continue;
        };
        write!(
            out,
            "{} {} {} {} {} {} {}",
            line.id,
            p0.x.min(p1.x),
            p0.y.min(p1.y),
            p0.z.min(p1.z),
            p0.x.max(p1.x),
            p0.y.max(p1.y),
            p0.z.max(p1.z)
        )?;
        write_tag_list(out, &model.physical_tags_of(1, line.id))?;
        writeln!(out, " 2 {} -{}", line.start, line.end)?;
    }
    for surface in &model.surfaces {
        let curves: Vec<i32> = surface
            .loops
            .iter()
            .filter_map(|&id| model.curve_loop(id).ok())
            .flat_map(|cl| cl.lines.iter().copied())
            .collect();
        let corners: Vec<[f64; 3]> = curves
            .iter()
            .filter_map(|&id| model.line(id).ok())
            .filter_map(|l| model.point(l.start).ok())
            .map(|p| [p.x, p.y, p.z])
            .collect();
        let (lo, hi) = bounding_box(&corners);
        write!(
            out,
            "{} {} {} {} {} {} {}",
            surface.id, lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]
        )?;
        write_tag_list(out, &model.physical_tags_of(2, surface.id))?;
        write_tag_list(out, &curves)?;
        writeln!(out)?;
    }
    writeln!(out, "$EndEntities")?;

    // Nodes are already grouped by owning entity.
    let mut node_blocks: Vec<(EntityRef, usize, usize)> = Vec::new();
    for (inode, node) in mesh.nodes.iter().enumerate() {
        match node_blocks.last_mut() {
            Some((entity, _, len)) if *entity == node.entity => *len += 1,
            _ => node_blocks.push((node.entity, inode, 1)),
        }
    }
    let nnodes = mesh.nodes.len();
    writeln!(out, "$Nodes\n{} {} {} {}", node_blocks.len(), nnodes, nnodes.min(1), nnodes)?;
    for (entity, first, len) in &node_blocks {
        writeln!(out, "{} {} 0 {}", entity.dim, entity.tag, len)?;
        for inode in *first..first + len {
            writeln!(out, "{}", inode + 1)?;
        }
        for node in &mesh.nodes[*first..first + len] {
            writeln!(out, "{} {} {}", node.x, node.y, node.z)?;
        }
    }
    writeln!(out, "$EndNodes")?;

    // Only entities in a physical group are saved.
    let saved: Vec<_> = mesh
        .blocks
        .iter()
        .filter(|b| !model.physical_tags_of(b.entity.dim, b.entity.tag).is_empty())
        .collect();
    let nelems: usize = saved.iter().map(|b| b.cells.len()).sum();
    writeln!(out, "$Elements\n{} {} {} {}", saved.len(), nelems, nelems.min(1), nelems)?;
    let mut elem_tag = 1;
    for block in saved {
        writeln!(
            out,
            "{} {} {} {}",
            block.entity.dim,
            block.entity.tag,
            block.kind.msh_type(),
            block.cells.len()
        )?;
        for cell in &block.cells {
            write!(out, "{elem_tag}")?;
            for inode in cell {
                write!(out, " {}", inode + 1)?;
            }
            writeln!(out)?;
            elem_tag += 1;
        }
    }
    writeln!(out, "$EndElements")?;
    Ok(())
}

fn bounding_box(points: &[[f64; 3]]) -> ([f64; 3], [f64; 3]) {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in points {
        for k in 0..3 {
            lo[k] = lo[k].min(p[k]);
            hi[k] = hi[k].max(p[k]);
        }
    }
    (lo, hi)
}

fn write_tag_list(out: &mut String, tags: &[i32]) -> std::fmt::Result {
    write!(out, " {}", tags.len())?;
    for t in tags {
        write!(out, " {t}")?;
    }
    Ok(())
}

pub fn read_msh(path: &Path) -> Result<MshMesh> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let content = if content.contains('\r') {
        content.replace("\r\n", "\n")
    } else {
        content
    };
    let mesh = parse_msh(&content, &path.display().to_string())?;
    debug!(
        "read {}: {} points, {} cell blocks",
        path.display(),
        mesh.points.nrows(),
        mesh.blocks.len()
    );
    Ok(mesh)
}

pub fn parse_msh(content: &str, file: &str) -> Result<MshMesh> {
    let format = section(content, "MeshFormat")
        .map_err(|_| Error::msh(file, "missing $MeshFormat section"))?
        .1;
    let (_, fields) =
        parse_line_tokens(format).map_err(|_| Error::msh(file, "malformed $MeshFormat"))?;
    if fields.len() < 2 || fields[0] != "4.1" || fields[1] != "0" {
        return Err(Error::msh(file, "only ASCII MSH 4.1 files are supported"));
    }

    let physical_names = match section(content, "PhysicalNames") {
        Ok((_, body)) => parse_physical_names(body)
            .map_err(|_| Error::msh(file, "malformed $PhysicalNames section"))?
            .1,
        Err(_) => Vec::new(),
    };
    let entity_physicals = match section(content, "Entities") {
        Ok((_, body)) => parse_entities(body)
            .map_err(|_| Error::msh(file, "malformed $Entities section"))?
            .1,
        Err(_) => HashMap::new(),
    };
    let (_, nodes_body) =
        section(content, "Nodes").map_err(|_| Error::msh(file, "missing $Nodes section"))?;
    let (_, (node_tags, coords)) =
        parse_nodes(nodes_body).map_err(|_| Error::msh(file, "malformed $Nodes section"))?;
    let (_, elems_body) =
        section(content, "Elements").map_err(|_| Error::msh(file, "missing $Elements section"))?;
    let (_, elem_blocks) = parse_elems(elems_body)
        .map_err(|_| Error::msh(file, "malformed $Elements section"))?;

    let index_of: HashMap<usize, usize> =
        node_tags.iter().enumerate().map(|(i, &t)| (t, i)).collect();
    let mut blocks = Vec::with_capacity(elem_blocks.len());
    for ((dim, etag, elem_type), elems) in elem_blocks {
        let Some(kind) = CellKind::from_msh_type(elem_type) else {
            continue;
        };
        let npc = kind.nodes_per_cell();
        let mut cells = Vec::with_capacity(elems.len());
        for elem in &elems {
            let Some((&elem_tag, elem_nodes)) = elem.split_first() else {
                return Err(Error::msh(file, "empty element line"));
            };
            if elem_nodes.len() != npc {
                return Err(Error::msh(
                    file,
                    format!(
                        "element {elem_tag} has {} nodes, expected {npc}",
                        elem_nodes.len()
                    ),
                ));
            }
            let cell = elem_nodes
                .iter()
                .map(|t| {
                    index_of
                        .get(t)
                        .copied()
                        .ok_or_else(|| Error::msh(file, format!("unknown node tag {t}")))
                })
                .collect::<Result<Vec<usize>>>()?;
            cells.push(cell);
        }
        let entity = EntityRef {
            dim,
            tag: etag as i32,
        };
        let physical = entity_physicals
            .get(&entity)
            .and_then(|tags| tags.first().copied());
        blocks.push(MshCellBlock {
            entity,
            kind,
            cells,
            physical,
        });
    }

    let npoints = coords.len();
    let flat: Vec<f64> = coords.into_iter().flat_map(|(x, y, z)| [x, y, z]).collect();
    let points = Array2::from_shape_vec((npoints, 3), flat)
        .map_err(|e| Error::msh(file, e.to_string()))?;
    Ok(MshMesh {
        points,
        blocks,
        physical_names,
    })
}

type PResult<'a, T> = IResult<&'a str, T>;

fn parse_line(input: &str) -> PResult<&str> {
    terminated(take_until("\n"), tag("\n"))(input)
}

fn parse_line_tokens(input: &str) -> PResult<Vec<&str>> {
    let (rest, line) = parse_line(input)?;
    Ok((rest, line.split_whitespace().collect()))
}

fn parse_line_usizes(input: &str) -> PResult<Vec<usize>> {
    let (rest, line) = parse_line(input)?;
    let v: std::result::Result<Vec<usize>, _> =
        line.split_whitespace().map(|x| x.parse::<usize>()).collect();
    match v {
        Ok(v) => Ok((rest, v)),
        Err(_) => Err(nom::Err::Error(NomError::new(input, ErrorKind::Digit))),
    }
}

fn parse_line_f64s(input: &str) -> PResult<Vec<f64>> {
    let (rest, line) = parse_line(input)?;
    let v: std::result::Result<Vec<f64>, _> =
        line.split_whitespace().map(|x| x.parse::<f64>()).collect();
    match v {
        Ok(v) => Ok((rest, v)),
        Err(_) => Err(nom::Err::Error(NomError::new(input, ErrorKind::Float))),
    }
}

fn parse_line_fixed<const N: usize>(input: &str) -> PResult<[usize; N]> {
    let (rest, v) = parse_line_usizes(input)?;
    match <[usize; N]>::try_from(v.as_slice()) {
        Ok(arr) => Ok((rest, arr)),
        Err(_) => Err(nom::Err::Error(NomError::new(input, ErrorKind::Count))),
    }
}

/// Body of `$name ... $Endname`, searched from the start of `input`.
fn section<'a>(input: &'a str, name: &str) -> PResult<'a, &'a str> {
    let open = format!("${name}\n");
    let close = format!("$End{name}");
    let parsed: PResult<'a, &'a str> = delimited(
        pair(take_until(open.as_str()), tag(open.as_str())),
        take_until(close.as_str()),
        tag(close.as_str()),
    )(input);
    parsed
}

fn parse_physical_name(input: &str) -> PResult<(usize, i32, String)> {
    let (rest, line) = parse_line(input)?;
    let fields: PResult<(&str, &str, &str)> = tuple((
        preceded(space0, terminated(digit1, space1)),
        terminated(recognize(pair(opt(char('-')), digit1)), space1),
        delimited(char('"'), take_until("\""), char('"')),
    ))(line);
    let (_, (dim, tag_str, name)) = fields?;
    let dim = dim
        .parse::<usize>()
        .map_err(|_| nom::Err::Error(NomError::new(input, ErrorKind::Digit)))?;
    let tag_value = tag_str
        .parse::<i32>()
        .map_err(|_| nom::Err::Error(NomError::new(input, ErrorKind::Digit)))?;
    Ok((rest, (dim, tag_value, name.to_string())))
}

fn parse_physical_names(input: &str) -> PResult<Vec<(usize, i32, String)>> {
    let (rest, [num]) = parse_line_fixed::<1>(input)?;
    count(parse_physical_name, num)(rest)
}

/// Entity -> physical tags, from the `$Entities` section.
fn parse_entities(input: &str) -> PResult<HashMap<EntityRef, Vec<i32>>> {
    let (mut rest, [npoints, ncurves, nsurfaces, nvolumes]) = parse_line_fixed::<4>(input)?;
    let mut physicals = HashMap::new();
    for (dim, num) in [(0, npoints), (1, ncurves), (2, nsurfaces), (3, nvolumes)] {
        // points carry one coordinate triple, higher dimensions a bounding box
        let skip = if dim == 0 { 3 } else { 6 };
        for _ in 0..num {
            let (next, tokens) = parse_line_tokens(rest)?;
            let fail = || nom::Err::Error(NomError::new(rest, ErrorKind::Digit));
            let id: i32 = tokens.first().and_then(|t| t.parse().ok()).ok_or_else(fail)?;
            let nphys: usize = tokens
                .get(1 + skip)
                .and_then(|t| t.parse().ok())
                .ok_or_else(fail)?;
            let tags = tokens
                .get(2 + skip..2 + skip + nphys)
                .ok_or_else(fail)?
                .iter()
                .map(|t| t.parse::<i32>().map_err(|_| fail()))
                .collect::<std::result::Result<Vec<i32>, _>>()?;
            physicals.insert(EntityRef { dim, tag: id }, tags);
            rest = next;
        }
    }
    Ok((rest, physicals))
}

fn parse_nodes_block(input: &str) -> PResult<(Vec<usize>, Vec<(f64, f64, f64)>)> {
    let (rest, [_, _, _, nbnodes]) = parse_line_fixed::<4>(input)?;
    let (rest, tags) = count(parse_line_usizes, nbnodes)(rest)?;
    let (rest, coords) = count(parse_line_f64s, nbnodes)(rest)?;
    let tags = tags
        .into_iter()
        .map(|v| match v.as_slice() {
            [tag] => Ok(*tag),
            _ => Err(nom::Err::Error(NomError::new(input, ErrorKind::Count))),
        })
        .collect::<std::result::Result<Vec<usize>, _>>()?;
    let mut xyz = Vec::with_capacity(nbnodes);
    for c in coords {
        if c.len() < 3 {
            return Err(nom::Err::Error(NomError::new(input, ErrorKind::Float)));
        }
        xyz.push((c[0], c[1], c[2]));
    }
    if tags.len() != xyz.len() {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Count)));
    }
    Ok((rest, (tags, xyz)))
}

fn parse_nodes(input: &str) -> PResult<(Vec<usize>, Vec<(f64, f64, f64)>)> {
    let (rest, [nbblocks, _, _, _]) = parse_line_fixed::<4>(input)?;
    let (rest, blocks) = count(parse_nodes_block, nbblocks)(rest)?;
    let mut tags = Vec::new();
    let mut coords = Vec::new();
    for (t, c) in blocks {
        tags.extend(t);
        coords.extend(c);
    }
    Ok((rest, (tags, coords)))
}

type ElemBlock = ((usize, usize, usize), Vec<Vec<usize>>);

fn parse_elems_block(input: &str) -> PResult<ElemBlock> {
    let (rest, [edim, etag, elem_type, nbelems]) = parse_line_fixed::<4>(input)?;
    let (rest, elems) = count(parse_line_usizes, nbelems)(rest)?;
    Ok((rest, ((edim, etag, elem_type), elems)))
}

fn parse_elems(input: &str) -> PResult<Vec<ElemBlock>> {
    let (rest, [nbblocks, _, _, _]) = parse_line_fixed::<4>(input)?;
    count(parse_elems_block, nbblocks)(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::model::GeoModel;

    const SMALL_MSH: &str = r#"$MeshFormat
4.1 0 8
$EndMeshFormat
$PhysicalNames
2
1 3 "Bottom Wall"
2 1 "Plate"
$EndPhysicalNames
$Entities
2 1 1 0
1 0 0 0 0
2 1 0 0 0
1 0 0 0 1 0 0 1 3 2 1 -2
1 0 0 0 1 1 0 1 1 1 1
$EndEntities
$Nodes
2 3 1 3
0 1 0 2
1
2
0 0 0
1 0 0
2 1 0 1
3
1 1 0
$EndNodes
$Elements
2 2 1 2
1 1 1 1
1 1 2
2 1 2 1
2 1 2 3
$EndElements
"#;

    #[test]
    fn test_parse_line() {
        let (rest, parsed) = parse_line("1 2 3\n a b c ").unwrap();
        assert_eq!(rest, " a b c ");
        assert_eq!(parsed, "1 2 3");
    }

    #[test]
    fn test_parse_line_usizes() {
        let (rest, parsed) = parse_line_usizes("1 2 3 4 5\n").unwrap();
        assert_eq!(rest, "");
        assert_eq!(parsed, vec![1, 2, 3, 4, 5]);
        assert!(parse_line_usizes("1 -2\n").is_err());
    }

    #[test]
    fn test_parse_line_f64s() {
        let (_, parsed) = parse_line_f64s("1 2.5 -3e-1\n").unwrap();
        assert_eq!(parsed, vec![1.0, 2.5, -0.3]);
    }

    #[test]
    fn test_parse_physical_name_with_spaces() {
        let (rest, parsed) = parse_physical_name("1 12 \"Segment 12\"\nnext").unwrap();
        assert_eq!(rest, "next");
        assert_eq!(parsed, (1, 12, "Segment 12".to_string()));
    }

    #[test]
    fn test_section_body() {
        let (rest, body) = section("junk\n$Nodes\n1 2\n$EndNodes\ntail", "Nodes").unwrap();
        assert_eq!(body, "1 2\n");
        assert_eq!(rest, "\ntail");
    }

    #[test]
    fn test_parse_small_file() {
        let mesh = parse_msh(SMALL_MSH, "small.msh").unwrap();
        assert_eq!(mesh.points.nrows(), 3);
        assert_eq!(mesh.points[[2, 0]], 1.0);
        assert_eq!(mesh.cell_count(CellKind::Line), 1);
        assert_eq!(mesh.cell_count(CellKind::Triangle), 1);
        assert_eq!(mesh.cells(CellKind::Triangle).unwrap().row(0).to_vec(), vec![0, 1, 2]);
        assert_eq!(mesh.physical_tags(CellKind::Line).unwrap().to_vec(), vec![3]);
        assert_eq!(mesh.physical_tags(CellKind::Triangle).unwrap().to_vec(), vec![1]);
        assert_eq!(mesh.physical_names[0], (1, 3, "Bottom Wall".to_string()));
    }

    #[test]
    fn test_missing_entities_means_no_physical_tags() {
        let start = SMALL_MSH.find("$Entities").unwrap();
        let end = SMALL_MSH.find("$Nodes").unwrap();
        let stripped = format!("{}{}", &SMALL_MSH[..start], &SMALL_MSH[end..]);
        let mesh = parse_msh(&stripped, "stripped.msh").unwrap();
        assert!(mesh.physical_tags(CellKind::Line).is_none());
    }

    #[test]
    fn test_rejects_other_versions() {
        let v2 = SMALL_MSH.replace("4.1 0 8", "2.2 0 8");
        assert!(matches!(parse_msh(&v2, "old.msh"), Err(Error::MshFormat { .. })));
        let binary = SMALL_MSH.replace("4.1 0 8", "4.1 1 8");
        assert!(parse_msh(&binary, "bin.msh").is_err());
    }

    #[test]
    fn test_unknown_node_tag_is_an_error() {
        let broken = SMALL_MSH.replace("2 1 2 3\n", "2 1 2 9\n");
        let err = parse_msh(&broken, "broken.msh").unwrap_err();
        assert!(err.to_string().contains("unknown node tag 9"));
    }

    #[test]
    fn test_blank_or_short_element_line_is_an_error() {
        let blank = SMALL_MSH.replace("1 1 1 1\n1 1 2\n", "1 1 1 1\n\n");
        let err = parse_msh(&blank, "blank.msh").unwrap_err();
        assert!(matches!(err, Error::MshFormat { .. }));
        assert!(err.to_string().contains("empty element line"));

        let short = SMALL_MSH.replace("1 1 1 1\n1 1 2\n", "1 1 1 1\n1 1\n");
        let err = parse_msh(&short, "short.msh").unwrap_err();
        assert!(err.to_string().contains("element 1 has 1 nodes, expected 2"));
    }

    #[test]
    fn test_node_tag_lines_hold_one_tag_each() {
        let blank = SMALL_MSH.replace("0 1 0 2\n1\n2\n", "0 1 0 2\n1\n\n");
        let err = parse_msh(&blank, "blank.msh").unwrap_err();
        assert!(err.to_string().contains("malformed $Nodes section"));

        let merged = SMALL_MSH.replace("0 1 0 2\n1\n2\n", "0 1 0 2\n1 2\n\n");
        assert!(matches!(
            parse_msh(&merged, "merged.msh"),
            Err(Error::MshFormat { .. })
        ));
    }

    #[test]
    fn test_write_then_read_generated_mesh() {
        let mut model = GeoModel::new("square");
        let p1 = model.add_point(0.0, 0.0, 0.0, 0.5).unwrap();
        let p2 = model.add_point(1.0, 0.0, 0.0, 0.5).unwrap();
        let p3 = model.add_point(1.0, 1.0, 0.0, 0.5).unwrap();
        let p4 = model.add_point(0.0, 1.0, 0.0, 0.5).unwrap();
        let lines = [
            model.add_line(p1, p2).unwrap(),
            model.add_line(p2, p3).unwrap(),
            model.add_line(p3, p4).unwrap(),
            model.add_line(p4, p1).unwrap(),
        ];
        let cl = model.add_curve_loop(&lines).unwrap();
        let s = model.add_plane_surface(&[cl]).unwrap();
        // only the bottom line and the surface are saved
        model.add_physical_group(1, &[lines[0]], 10).unwrap();
        model.set_physical_name(1, 10, "Floor").unwrap();
        model.add_physical_group(2, &[s], 1).unwrap();
        let generated = model.generate(2).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.msh");
        write_msh(&path, &generated, &model).unwrap();
        let mesh = read_msh(&path).unwrap();

        assert_eq!(mesh.points.nrows(), generated.nodes.len());
        for (i, node) in generated.nodes.iter().enumerate() {
            assert_eq!(mesh.points.row(i).to_vec(), vec![node.x, node.y, node.z]);
        }
        assert_eq!(mesh.cell_count(CellKind::Line), 2);
        assert_eq!(mesh.cell_count(CellKind::Triangle), 8);
        assert_eq!(mesh.physical_tags(CellKind::Line).unwrap().to_vec(), vec![10, 10]);
        assert!(mesh.physical_names.contains(&(1, 10, "Floor".to_string())));
        // unnamed groups are not listed
        assert_eq!(mesh.physical_names.len(), 1);
    }
}

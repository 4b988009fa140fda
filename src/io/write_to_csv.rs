use std::path::Path;

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::error::{Error, Result, ensure_parent_dir};
use crate::solver::Temperature;

#[derive(Serialize)]
struct PointData {
    x: f64,
    y: f64,
    temperature: f64,
}

/// One `x,y,temperature` row per mesh node, with a header.
pub fn write_nodal_csv(path: &Path, temperature: &Temperature) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = Writer::from_path(path)?;
    for (node, &value) in temperature.mesh().nodes.iter().zip(temperature.values()) {
        let data = PointData {
            x: node.x,
            y: node.y,
            temperature: value,
        };
        writer.serialize(data)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    info!("wrote {}", path.display());
    Ok(())
}

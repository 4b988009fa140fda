use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Target};
use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mesh_builder::MeshParams;
use crate::solver::ThermalParams;

pub const DEFAULT_CONFIG: &str = "inputs/pipeline.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertParams {
    pub volume_file: PathBuf,
    pub boundary_file: PathBuf,
}
impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            volume_file: PathBuf::from("mesh/square_mesh.vtu"),
            boundary_file: PathBuf::from("mesh/square_lines.vtu"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveParams {
    pub output_file: PathBuf,
    pub csv_file: Option<PathBuf>,
    #[serde(flatten)]
    pub thermal: ThermalParams,
}
impl Default for SolveParams {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("outputs/temperature.vtu"),
            csv_file: None,
            thermal: ThermalParams::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub mesh: MeshParams,
    pub convert: ConvertParams,
    pub solve: SolveParams,
}

impl PipelineParams {
    pub fn parse(file_path: &Path) -> Result<Self> {
        let file_content = fs::read_to_string(file_path).map_err(|e| Error::io(file_path, e))?;
        let params: PipelineParams = serde_json::from_str(&file_content)?;
        info!("parameters read from {}", file_path.display());
        Ok(params)
    }
    /// Like `parse`, but a missing file yields the defaults.
    pub fn parse_or_default(file_path: &Path) -> Result<Self> {
        if file_path.exists() {
            Self::parse(file_path)
        } else {
            warn!(
                "{} not found, using default parameters",
                file_path.display()
            );
            Ok(Self::default())
        }
    }
}

/// Installs the `env_logger` backend. `level` wins over `RUST_LOG`; the default
/// is `info`. Later calls are no-ops.
pub fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| {
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|v| v.parse::<LevelFilter>().ok())
        })
        .unwrap_or(LevelFilter::Info);

    let _ = Builder::new()
        .filter_level(log_level)
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .try_init();
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use segmented_heat::converter::convert_mesh;
use segmented_heat::initialization::{self, DEFAULT_CONFIG, PipelineParams};
use segmented_heat::io::write_to_csv::write_nodal_csv;
use segmented_heat::mesh_builder::create_msh;
use segmented_heat::solver::solve_thermal_problem;
use segmented_heat::tags::TagDictionary;

#[derive(Parser)]
#[command(
    name = "segmented-heat",
    version,
    about = "Segmented-rectangle mesh and steady heat solver"
)]
struct Cli {
    /// JSON parameter file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the geometry, write the tag dictionary and the MSH mesh
    Mesh {
        #[arg(long)]
        mesh_file: Option<PathBuf>,
        #[arg(long)]
        tags_file: Option<PathBuf>,
        #[arg(long)]
        num_segments: Option<usize>,
    },
    /// Split the MSH mesh into volume and boundary VTU files
    Convert {
        #[arg(long)]
        mesh_file: Option<PathBuf>,
        #[arg(long)]
        volume_file: Option<PathBuf>,
        #[arg(long)]
        boundary_file: Option<PathBuf>,
    },
    /// Solve the steady heat problem on the converted mesh
    Solve {
        #[arg(long)]
        volume_file: Option<PathBuf>,
        #[arg(long)]
        boundary_file: Option<PathBuf>,
        #[arg(long)]
        tags_file: Option<PathBuf>,
        #[arg(long)]
        output_file: Option<PathBuf>,
    },
    /// Run mesh, convert and solve in order
    Run,
}

fn run_mesh(params: &PipelineParams) -> Result<()> {
    create_msh(&params.mesh).context("mesh generation failed")?;
    Ok(())
}

fn run_convert(params: &PipelineParams) -> Result<()> {
    convert_mesh(
        &params.mesh.mesh_file,
        &params.convert.volume_file,
        &params.convert.boundary_file,
    )
    .context("mesh conversion failed")?;
    Ok(())
}

fn run_solve(params: &PipelineParams) -> Result<()> {
    let tags = TagDictionary::read(&params.mesh.tags_file)
        .with_context(|| format!("reading {}", params.mesh.tags_file.display()))?;
    let temperature = solve_thermal_problem(
        &params.convert.volume_file,
        &params.convert.boundary_file,
        &params.solve.output_file,
        &tags,
        &params.solve.thermal,
    )
    .context("thermal solve failed")?;
    if let Some(csv_file) = &params.solve.csv_file {
        write_nodal_csv(csv_file, &temperature).context("writing nodal csv")?;
    }
    Ok(())
}

/// Folds the command-line path overrides into the loaded parameters.
fn apply_overrides(command: &Command, params: &mut PipelineParams) {
    match command {
        Command::Mesh {
            mesh_file,
            tags_file,
            num_segments,
        } => {
            if let Some(f) = mesh_file {
                params.mesh.mesh_file = f.clone();
            }
            if let Some(f) = tags_file {
                params.mesh.tags_file = f.clone();
            }
            if let Some(n) = num_segments {
                params.mesh.num_segments = *n;
            }
        }
        Command::Convert {
            mesh_file,
            volume_file,
            boundary_file,
        } => {
            if let Some(f) = mesh_file {
                params.mesh.mesh_file = f.clone();
            }
            if let Some(f) = volume_file {
                params.convert.volume_file = f.clone();
            }
            if let Some(f) = boundary_file {
                params.convert.boundary_file = f.clone();
            }
        }
        Command::Solve {
            volume_file,
            boundary_file,
            tags_file,
            output_file,
        } => {
            if let Some(f) = volume_file {
                params.convert.volume_file = f.clone();
            }
            if let Some(f) = boundary_file {
                params.convert.boundary_file = f.clone();
            }
            if let Some(f) = tags_file {
                params.mesh.tags_file = f.clone();
            }
            if let Some(f) = output_file {
                params.solve.output_file = f.clone();
            }
        }
        Command::Run => {}
    }
}

fn execute(command: &Command, params: &PipelineParams) -> Result<()> {
    match command {
        Command::Mesh { .. } => run_mesh(params),
        Command::Convert { .. } => run_convert(params),
        Command::Solve { .. } => run_solve(params),
        Command::Run => {
            run_mesh(params)?;
            run_convert(params)?;
            run_solve(params)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialization::init_logging(cli.log_level.as_deref());
    let mut params = PipelineParams::parse_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    apply_overrides(&cli.command, &mut params);
    execute(&cli.command, &params)?;
    info!("done");
    Ok(())
}

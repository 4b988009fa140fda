use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid input rejected by the geometry kernel or the mesher.
    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("a geometry session is already active in this process")]
    SessionActive,

    #[error("MSH format error in {file}: {message}")]
    MshFormat { file: String, message: String },

    #[error("mesh has no `{0}` cell block")]
    MissingCellBlock(&'static str),

    #[error("`{0}` cells carry no physical tag data")]
    MissingPhysicalTags(&'static str),

    #[error("VTU error in {}: {message}", path.display())]
    Vtu { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("boundary markers do not match the volume mesh: {0}")]
    BoundaryMismatch(String),

    #[error("no boundary named `{0}` in the tag dictionary")]
    UnknownBoundary(String),

    #[error("linear solve failed: {0}")]
    LinearSolve(String),

    #[error("conjugate gradients did not converge after {iterations} iterations (relative residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
    pub(crate) fn msh(file: &str, message: impl Into<String>) -> Self {
        Error::MshFormat {
            file: file.to_string(),
            message: message.into(),
        }
    }
    pub(crate) fn vtu(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Vtu {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Creates the parent directory of `path` if it has one.
pub(crate) fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    Ok(())
}

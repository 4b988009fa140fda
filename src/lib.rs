pub mod converter;
pub mod disc;
pub mod error;
pub mod geo;
pub mod initialization;
pub mod io;
pub mod mesh_builder;
pub mod solver;
pub mod tags;

pub use error::{Error, Result};

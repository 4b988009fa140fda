pub mod boundary;
pub mod cg_basis;
pub mod geometric;
pub mod linear_elliptic;
pub mod mesh;

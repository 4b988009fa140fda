pub mod mesher;
pub mod model;
pub mod session;

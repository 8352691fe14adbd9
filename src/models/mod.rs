mod coordinates;
mod vector_3d;

pub use coordinates::*;
pub use vector_3d::*;

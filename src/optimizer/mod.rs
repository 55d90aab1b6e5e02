pub mod constraints;
pub mod model;
pub mod solver;

pub use constraints::*;
pub use model::*;
pub use solver::*;

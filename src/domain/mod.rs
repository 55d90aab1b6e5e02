pub mod energy_system;
pub mod flow;
pub mod node;
pub mod types;

pub use energy_system::*;
pub use flow::*;
pub use node::*;
pub use types::*;

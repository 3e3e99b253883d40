pub mod edge;
pub mod graph;
pub mod persist;

pub use edge::*;
pub use graph::*;
pub use persist::*;

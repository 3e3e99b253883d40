//! Core primitives shared by the WalkGraph crates: node and weight types,
//! structural limits, the error taxonomy and layered configuration.

pub mod error;
pub mod settings;
pub mod types;

pub use error::*;
pub use settings::*;
pub use types::*;

//! Query profiling, three-tier topology synthesis and the
//! synthesize-then-evaluate search loop.

pub mod profile;
pub mod search;
pub mod synthesizer;
pub mod tiers;

pub use profile::*;
pub use search::*;
pub use synthesizer::*;
pub use tiers::*;

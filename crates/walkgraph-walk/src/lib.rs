//! WalkGraph random-walk evaluation
//!
//! Provides:
//! - Transition tables built once per graph, shared by every trial
//! - Pluggable step samplers (weighted choice, greedy heaviest-edge)
//! - Seedable per-trial random sources for reproducible, parallel trials
//! - Workload-weighted success-rate and path-length statistics
//! - Injectable score policies for ranking candidate topologies

pub mod evaluator;
pub mod rng;
pub mod sampler;
pub mod score;
pub mod stats;

pub use evaluator::*;
pub use rng::*;
pub use sampler::*;
pub use score::*;
pub use stats::*;

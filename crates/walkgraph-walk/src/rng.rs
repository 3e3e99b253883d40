use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use walkgraph_core::NodeId;

/// Supplies the random stream for one simulated walk.
///
/// Each `(target, trial)` pair gets its own generator, so trials never share
/// sampling state and may run on any thread in any order.
pub trait RandomSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn trial_rng(&self, target: NodeId, trial: u64) -> Box<dyn RngCore>;
}

/// Deterministic source: every trial is seeded from `(seed, target, trial)`.
///
/// Parallel and sequential evaluation produce bit-identical results, and the
/// same trial sees the same stream across candidate graphs.
#[derive(Debug, Clone, Copy)]
pub struct SeededSource {
    seed: u64,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn trial_seed(&self, target: NodeId, trial: u64) -> u64 {
        let mixed = splitmix64(self.seed ^ splitmix64(u64::from(target)));
        splitmix64(mixed ^ trial.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl Default for SeededSource {
    fn default() -> Self {
        Self::new(0xACE1)
    }
}

impl RandomSource for SeededSource {
    fn name(&self) -> &'static str {
        "seeded"
    }

    fn trial_rng(&self, target: NodeId, trial: u64) -> Box<dyn RngCore> {
        Box::new(StdRng::seed_from_u64(self.trial_seed(target, trial)))
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

use serde::{Deserialize, Serialize};

/// Path-length distribution over successful walks.
///
/// Percentiles are weighted lower percentiles: the smallest observed length
/// whose cumulative weight reaches `q` of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathLengthStats {
    pub samples: usize,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub p95: f64,
    pub min: usize,
    pub max: usize,
}

impl PathLengthStats {
    /// Unweighted statistics; `None` when there are no samples.
    pub fn from_lengths(lengths: &[usize]) -> Option<Self> {
        let weighted: Vec<(usize, f64)> = lengths.iter().map(|&len| (len, 1.0)).collect();
        Self::from_weighted(weighted)
    }

    /// Statistics over `(length, weight)` pairs. Pairs with non-positive
    /// weight are ignored.
    pub fn from_weighted(mut samples: Vec<(usize, f64)>) -> Option<Self> {
        samples.retain(|&(_, w)| w > 0.0);
        if samples.is_empty() {
            return None;
        }
        samples.sort_by_key(|&(len, _)| len);

        let total: f64 = samples.iter().map(|&(_, w)| w).sum();
        let mean = samples.iter().map(|&(len, w)| len as f64 * w).sum::<f64>() / total;

        Some(Self {
            samples: samples.len(),
            mean,
            median: weighted_percentile(&samples, total, 0.5),
            p90: weighted_percentile(&samples, total, 0.9),
            p95: weighted_percentile(&samples, total, 0.95),
            min: samples[0].0,
            max: samples[samples.len() - 1].0,
        })
    }
}

fn weighted_percentile(sorted: &[(usize, f64)], total: f64, q: f64) -> f64 {
    let threshold = q * total;
    let mut cumulative = 0.0;
    for &(len, w) in sorted {
        cumulative += w;
        // Tolerate float drift when weights are fractions of a whole.
        if cumulative >= threshold - 1e-9 * total {
            return len as f64;
        }
    }
    sorted[sorted.len() - 1].0 as f64
}

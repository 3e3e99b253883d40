use crate::EvaluationSummary;

/// Collapses an evaluation into the scalar used to rank candidate topologies.
/// Higher is better.
///
/// Any `Fn(&EvaluationSummary) -> f64` closure is a policy, so alternative
/// objectives can be plugged in without touching synthesis or evaluation.
pub trait ScorePolicy: Send + Sync {
    fn score(&self, summary: &EvaluationSummary) -> f64;
}

impl<F> ScorePolicy for F
where
    F: Fn(&EvaluationSummary) -> f64 + Send + Sync,
{
    fn score(&self, summary: &EvaluationSummary) -> f64 {
        self(summary)
    }
}

/// `success_weight * success_rate - length_weight * median / step_cap`
///
/// The median is taken over successful walks; with no successes the length
/// term is charged at the full step cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedScore {
    pub success_weight: f64,
    pub length_weight: f64,
}

impl WeightedScore {
    pub fn new(success_weight: f64, length_weight: f64) -> Self {
        Self {
            success_weight,
            length_weight,
        }
    }
}

impl Default for WeightedScore {
    fn default() -> Self {
        Self::new(1.0, 0.1)
    }
}

impl ScorePolicy for WeightedScore {
    fn score(&self, summary: &EvaluationSummary) -> f64 {
        let cap = summary.step_cap.max(1) as f64;
        let median = summary.median_path_length().unwrap_or(cap);
        self.success_weight * summary.success_rate - self.length_weight * (median / cap)
    }
}

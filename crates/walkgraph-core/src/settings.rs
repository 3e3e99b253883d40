// ABOUTME: Layered configuration for synthesis, evaluation and search
// ABOUTME: Merge order is default -> <env> -> local -> explicit, then WALKGRAPH__* env vars
use crate::{GraphLimits, Result, StartDistribution, WalkGraphError, WeightTriple};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalkGraphConfig {
    #[serde(default)]
    pub limits: GraphLimits,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Reference structural parameters, used when no search grid is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Number of ranked nodes in the high-value chain.
    #[serde(default = "SynthesisConfig::default_tier_a")]
    pub tier_a: usize,
    /// Exclusive end rank of the medium-value tier.
    #[serde(default = "SynthesisConfig::default_tier_b_end")]
    pub tier_b_end: usize,
    #[serde(default = "SynthesisConfig::default_skip_distance")]
    pub skip_distance: usize,
    #[serde(default)]
    pub weights: WeightTriple,
}

impl SynthesisConfig {
    fn default_tier_a() -> usize {
        10
    }

    fn default_tier_b_end() -> usize {
        50
    }

    fn default_skip_distance() -> usize {
        3
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            tier_a: Self::default_tier_a(),
            tier_b_end: Self::default_tier_b_end(),
            skip_distance: Self::default_skip_distance(),
            weights: WeightTriple::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Walks simulated per queried target.
    #[serde(default = "EvaluationConfig::default_trials_per_target")]
    pub trials_per_target: usize,
    /// Maximum number of steps before a walk counts as a failure.
    #[serde(default = "EvaluationConfig::default_step_cap")]
    pub step_cap: usize,
    #[serde(default = "EvaluationConfig::default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub start: StartDistribution,
    /// Run trials on the rayon pool.
    #[serde(default = "EvaluationConfig::default_parallel")]
    pub parallel: bool,
    /// Keep visited paths on every walk result (diagnostics only).
    #[serde(default)]
    pub record_paths: bool,
}

impl EvaluationConfig {
    fn default_trials_per_target() -> usize {
        1000
    }

    fn default_step_cap() -> usize {
        50
    }

    fn default_seed() -> u64 {
        0x5EED_0F_5A1C
    }

    fn default_parallel() -> bool {
        true
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            trials_per_target: Self::default_trials_per_target(),
            step_cap: Self::default_step_cap(),
            seed: Self::default_seed(),
            start: StartDistribution::default(),
            parallel: Self::default_parallel(),
            record_paths: false,
        }
    }
}

/// Candidate grid and scoring weights for the search loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "SearchConfig::default_tier_a_sizes")]
    pub tier_a_sizes: Vec<usize>,
    #[serde(default = "SearchConfig::default_tier_b_ends")]
    pub tier_b_ends: Vec<usize>,
    #[serde(default = "SearchConfig::default_skip_distances")]
    pub skip_distances: Vec<usize>,
    #[serde(default = "SearchConfig::default_weight_triples")]
    pub weight_triples: Vec<WeightTriple>,
    /// How many times a candidate over the edge budget is retried with a
    /// narrower medium tier before it is skipped.
    #[serde(default = "SearchConfig::default_boundary_retries")]
    pub boundary_retries: usize,
    #[serde(default = "SearchConfig::default_success_weight")]
    pub success_weight: f64,
    #[serde(default = "SearchConfig::default_length_weight")]
    pub length_weight: f64,
}

impl SearchConfig {
    fn default_tier_a_sizes() -> Vec<usize> {
        vec![5, 10, 15]
    }

    fn default_tier_b_ends() -> Vec<usize> {
        vec![40, 50, 60]
    }

    fn default_skip_distances() -> Vec<usize> {
        vec![2, 3, 5]
    }

    fn default_weight_triples() -> Vec<WeightTriple> {
        vec![
            WeightTriple::new(10.0, 8.0, 1.0),
            WeightTriple::new(10.0, 1.0, 0.1),
            WeightTriple::new(10.0, 0.1, 0.01),
        ]
    }

    fn default_boundary_retries() -> usize {
        4
    }

    fn default_success_weight() -> f64 {
        1.0
    }

    fn default_length_weight() -> f64 {
        0.1
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tier_a_sizes: Self::default_tier_a_sizes(),
            tier_b_ends: Self::default_tier_b_ends(),
            skip_distances: Self::default_skip_distances(),
            weight_triples: Self::default_weight_triples(),
            boundary_retries: Self::default_boundary_retries(),
            success_weight: Self::default_success_weight(),
            length_weight: Self::default_length_weight(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_format() -> String {
        "pretty".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

impl WalkGraphConfig {
    /// Merge configuration sources from `config_dir` and the environment.
    ///
    /// Every file is optional except `explicit`, which must exist when given.
    pub fn load_from_sources(
        config_dir: &Path,
        env_name: &str,
        explicit: Option<&Path>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                config::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(config::File::from(config_dir.join("local.toml")).required(false));

        if let Some(path) = explicit {
            debug!("adding explicit config file {}", path.display());
            builder = builder.add_source(config::File::from(PathBuf::from(path)).required(true));
        }

        let settings: WalkGraphConfig = builder
            .add_source(config::Environment::with_prefix("WALKGRAPH").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;

        debug!(
            nodes = settings.limits.node_count,
            edge_budget = settings.limits.max_total_edges,
            step_cap = settings.evaluation.step_cap,
            "configuration loaded from {}",
            config_dir.display()
        );
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: WalkGraphConfig = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(WalkGraphError::Config(msg.to_string()));

        if self.limits.node_count == 0 {
            return fail("limits.node_count must be > 0");
        }
        if self.limits.max_total_edges < self.limits.node_count {
            return fail("limits.max_total_edges must allow one outgoing edge per node");
        }
        if self.limits.max_out_degree == 0 {
            return fail("limits.max_out_degree must be > 0");
        }
        if !(self.limits.max_weight.is_finite() && self.limits.max_weight > 0.0) {
            return fail("limits.max_weight must be a positive number");
        }
        if !self.synthesis.weights.is_strictly_ordered() {
            return fail("synthesis.weights must satisfy primary > secondary > backup > 0");
        }
        if self
            .search
            .weight_triples
            .iter()
            .any(|w| !w.is_strictly_ordered())
        {
            return fail("search.weight_triples must satisfy primary > secondary > backup > 0");
        }
        if self.evaluation.step_cap == 0 {
            return fail("evaluation.step_cap must be > 0");
        }
        if self.evaluation.trials_per_target == 0 {
            return fail("evaluation.trials_per_target must be > 0");
        }
        if self.search.success_weight < 0.0 || self.search.length_weight < 0.0 {
            return fail("search score weights must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_match_reference_parameters() {
        let cfg = WalkGraphConfig::default();
        assert_eq!(cfg.limits.node_count, 500);
        assert_eq!(cfg.limits.max_total_edges, 1000);
        assert_eq!(cfg.synthesis.tier_a, 10);
        assert_eq!(cfg.synthesis.tier_b_end, 50);
        assert_eq!(cfg.synthesis.skip_distance, 3);
        assert_eq!(cfg.synthesis.weights, WeightTriple::new(10.0, 8.0, 1.0));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn shipped_default_file_matches_defaults() {
        let cfg = WalkGraphConfig::from_toml_str(include_str!("../../../config/default.toml"))
            .unwrap();
        let defaults = WalkGraphConfig::default();
        assert_eq!(cfg.limits, defaults.limits);
        assert_eq!(cfg.synthesis.weights, defaults.synthesis.weights);
        assert_eq!(cfg.search.weight_triples, defaults.search.weight_triples);
        assert_eq!(cfg.evaluation.seed, defaults.evaluation.seed);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = WalkGraphConfig::from_toml_str(
            r#"
            [evaluation]
            step_cap = 30
            start = { fixed = 7 }

            [search]
            skip_distances = [4]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.evaluation.step_cap, 30);
        assert_eq!(cfg.evaluation.start, StartDistribution::Fixed(7));
        assert_eq!(cfg.evaluation.trials_per_target, 1000);
        assert_eq!(cfg.search.skip_distances, vec![4]);
        assert_eq!(cfg.search.tier_a_sizes, vec![5, 10, 15]);
    }

    #[test]
    fn rejects_unordered_weights() {
        let err = WalkGraphConfig::from_toml_str(
            r#"
            [synthesis.weights]
            primary = 1.0
            secondary = 8.0
            backup = 10.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, WalkGraphError::Config(_)));
    }

    #[test]
    fn layered_files_override_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[limits]\nnode_count = 200\nmax_total_edges = 400\n",
        )
        .unwrap();
        fs::write(dir.path().join("local.toml"), "[limits]\nmax_total_edges = 600\n").unwrap();

        let cfg = WalkGraphConfig::load_from_sources(dir.path(), "test", None).unwrap();
        assert_eq!(cfg.limits.node_count, 200);
        assert_eq!(cfg.limits.max_total_edges, 600);
    }
}

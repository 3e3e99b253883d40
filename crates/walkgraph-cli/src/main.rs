use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkgraph_core::{EvaluationConfig, LoggingConfig, NodeId, WalkGraphConfig};
use walkgraph_graph::{load_query_log, WalkGraph};
use walkgraph_synth::{
    CandidateGrid, CandidateRecord, ProfileReport, QueryProfile, SearchLoop, StructuralParams,
    SynthesisReport, TierAssignment, TopologySynthesizer,
};
use walkgraph_walk::{Evaluator, PathLengthStats, WeightedScore};

#[derive(Parser)]
#[command(name = "walkgraph")]
#[command(about = "WalkGraph - query-driven topologies for weighted random-walk lookups")]
#[command(long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Directory holding default.toml, <env>.toml and local.toml
    #[arg(long, global = true, env = "WALKGRAPH_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Environment overlay to load from the config directory
    #[arg(long, global = true, env = "WALKGRAPH_ENV", default_value = "development")]
    env: String,

    /// Extra configuration file, applied after the config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarise a query log
    Profile {
        /// Query log (results document or JSON array of targets)
        log: PathBuf,

        /// Number of top targets to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Build the configured reference topology without searching
    Synthesize {
        log: PathBuf,

        /// Where to write the adjacency JSON
        #[arg(long)]
        out: PathBuf,

        /// Rank nodes by id when the log is empty
        #[arg(long)]
        fallback: bool,
    },

    /// Search the candidate grid and write the best topology
    Optimize {
        log: PathBuf,

        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        evaluation: EvaluationArgs,
    },

    /// Measure a stored topology against a query log
    Evaluate {
        graph: PathBuf,

        log: PathBuf,

        #[command(flatten)]
        evaluation: EvaluationArgs,
    },

    /// Check a stored topology against the structural limits
    Validate { graph: PathBuf },
}

#[derive(clap::Args, Debug)]
struct EvaluationArgs {
    /// Walks per queried target
    #[arg(long)]
    trials: Option<usize>,

    /// Maximum steps per walk
    #[arg(long)]
    step_cap: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Run trials on a single thread
    #[arg(long)]
    sequential: bool,
}

impl EvaluationArgs {
    fn apply(&self, settings: &mut EvaluationConfig) {
        if let Some(trials) = self.trials {
            settings.trials_per_target = trials;
        }
        if let Some(step_cap) = self.step_cap {
            settings.step_cap = step_cap;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if self.sequential {
            settings.parallel = false;
        }
    }
}

#[derive(Serialize)]
struct ProfileResult {
    log: String,
    #[serde(flatten)]
    report: ProfileReport,
    never_queried: usize,
}

#[derive(Serialize)]
struct SynthesisResult {
    graph: String,
    params: String,
    #[serde(flatten)]
    report: SynthesisReport,
}

#[derive(Serialize)]
struct EvaluationResult {
    trials: usize,
    success_rate: f64,
    median_path_length: Option<f64>,
    path_lengths: Option<PathLengthStats>,
    score: f64,
}

#[derive(Serialize)]
struct OptimizeResult {
    graph: String,
    params: String,
    evaluated: usize,
    skipped: usize,
    evaluation: EvaluationResult,
    synthesis: SynthesisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<CandidateRecord>>,
}

#[derive(Serialize)]
struct ValidationResult {
    graph: String,
    valid: bool,
    nodes: usize,
    edges: usize,
    max_out_degree: usize,
    utilisation: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        WalkGraphConfig::load_from_sources(&cli.config_dir, &cli.env, cli.config.as_deref())
            .context("Failed to load configuration")?;
    init_tracing(&config.logging, cli.verbose);
    log_configuration(&cli, &config);

    match execute_command(&cli, config) {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so JSON output on stdout stays parseable.
    match logging.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Runs once the subscriber is installed; loading happens before logging
/// is configured.
fn log_configuration(cli: &Cli, config: &WalkGraphConfig) {
    info!(
        config_dir = %cli.config_dir.display(),
        env = %cli.env,
        nodes = config.limits.node_count,
        edge_budget = config.limits.max_total_edges,
        step_cap = config.evaluation.step_cap,
        "configuration loaded"
    );
}

fn execute_command(cli: &Cli, mut config: WalkGraphConfig) -> Result<serde_json::Value> {
    match &cli.command {
        Commands::Profile { log, top } => execute_profile(&config, log, *top),
        Commands::Synthesize { log, out, fallback } => {
            execute_synthesize(&config, log, out, *fallback)
        }
        Commands::Optimize {
            log,
            out,
            evaluation,
        } => {
            evaluation.apply(&mut config.evaluation);
            execute_optimize(&config, log, out, cli.verbose)
        }
        Commands::Evaluate {
            graph,
            log,
            evaluation,
        } => {
            evaluation.apply(&mut config.evaluation);
            execute_evaluate(&config, graph, log)
        }
        Commands::Validate { graph } => execute_validate(&config, graph),
    }
}

fn read_log(path: &Path) -> Result<Vec<NodeId>> {
    load_query_log(path).with_context(|| format!("Failed to read query log {}", path.display()))
}

fn read_profile(path: &Path) -> Result<QueryProfile> {
    let log = read_log(path)?;
    QueryProfile::from_log(&log).with_context(|| format!("Cannot profile {}", path.display()))
}

fn read_graph(path: &Path) -> Result<WalkGraph> {
    WalkGraph::load(path).with_context(|| format!("Failed to load graph {}", path.display()))
}

fn execute_profile(config: &WalkGraphConfig, log: &Path, top: usize) -> Result<serde_json::Value> {
    let profile = read_profile(log)?;
    let coverage = [config.synthesis.tier_a, config.synthesis.tier_b_end];
    let result = ProfileResult {
        log: log.display().to_string(),
        report: profile.report(top, &coverage),
        never_queried: profile.never_queried(config.limits.node_count).len(),
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_synthesize(
    config: &WalkGraphConfig,
    log: &Path,
    out: &Path,
    fallback: bool,
) -> Result<serde_json::Value> {
    let params = StructuralParams::from_config(&config.synthesis)?;
    let queries = read_log(log)?;
    let node_count = config.limits.node_count;

    let tiers = if queries.is_empty() && fallback {
        warn!("query log is empty, ranking nodes by id");
        TierAssignment::fallback(node_count, params.boundaries)
    } else {
        let profile = QueryProfile::from_log(&queries)
            .with_context(|| format!("Cannot profile {}", log.display()))?;
        TierAssignment::from_profile(&profile, node_count, params.boundaries)?
    };

    let graph = TopologySynthesizer::new(config.limits)
        .synthesize(&tiers, &params)
        .context("Failed to synthesize topology")?;
    graph
        .save(out)
        .with_context(|| format!("Failed to write graph {}", out.display()))?;
    info!("wrote {} edges to {}", graph.edge_count(), out.display());

    let result = SynthesisResult {
        graph: out.display().to_string(),
        params: params.to_string(),
        report: SynthesisReport::new(&graph, &tiers, &config.limits),
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_optimize(
    config: &WalkGraphConfig,
    log: &Path,
    out: &Path,
    verbose: bool,
) -> Result<serde_json::Value> {
    let profile = read_profile(log)?;
    let grid = CandidateGrid::from_config(&config.search)?;
    let outcome = SearchLoop::from_config(config)
        .run(&profile, &grid)
        .context("Topology search failed")?;

    outcome
        .graph
        .save(out)
        .with_context(|| format!("Failed to write graph {}", out.display()))?;

    let summary = &outcome.summary;
    let result = OptimizeResult {
        graph: out.display().to_string(),
        params: outcome.params.to_string(),
        evaluated: outcome.evaluated,
        skipped: outcome.skipped,
        evaluation: EvaluationResult {
            trials: summary.trials,
            success_rate: summary.success_rate,
            median_path_length: summary.median_path_length(),
            path_lengths: summary.path_lengths.clone(),
            score: summary.score,
        },
        synthesis: SynthesisReport::new(&outcome.graph, &outcome.tiers, &config.limits),
        history: verbose.then(|| outcome.history.clone()),
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_evaluate(
    config: &WalkGraphConfig,
    graph_path: &Path,
    log: &Path,
) -> Result<serde_json::Value> {
    let graph = read_graph(graph_path)?;
    if let Err(violation) = graph.validate(&config.limits) {
        warn!(%violation, "evaluating a graph outside the structural limits");
    }
    let profile = read_profile(log)?;
    let policy = WeightedScore::new(config.search.success_weight, config.search.length_weight);
    let summary = Evaluator::new(config.evaluation.clone())
        .with_score_policy(policy)
        .evaluate(&graph, &profile.workload())
        .context("Evaluation failed")?;

    let result = EvaluationResult {
        trials: summary.trials,
        success_rate: summary.success_rate,
        median_path_length: summary.median_path_length(),
        path_lengths: summary.path_lengths.clone(),
        score: summary.score,
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_validate(config: &WalkGraphConfig, graph_path: &Path) -> Result<serde_json::Value> {
    let graph = read_graph(graph_path)?;
    if let Err(violation) = graph.validate(&config.limits) {
        bail!("{} is invalid: {}", graph_path.display(), violation);
    }
    let result = ValidationResult {
        graph: graph_path.display().to_string(),
        valid: true,
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        max_out_degree: graph.max_out_degree(),
        utilisation: graph.budget_utilisation(&config.limits),
    };
    Ok(serde_json::to_value(result)?)
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value, 0)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}{}: {}", indent, key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}{}: {}", indent, key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}{}: {}", indent, key_colored, val_colored);
                    }
                    serde_json::Value::Object(_) => {
                        println!("{}{}:", indent, key_colored);
                        print_pretty(val, depth + 1)?;
                    }
                    _ => {
                        println!("{}{}: {}", indent, key_colored, val);
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}{}:", indent, "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item, depth + 1)?;
            }
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

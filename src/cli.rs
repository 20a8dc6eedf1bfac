use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{agent::PolicyKind, config::SimulationConfig, generator::ModelKind};

/// Threshold-trading bandits against prophet baselines
#[derive(Parser, Debug)]
#[command(name = "prophet")]
#[command(author, version, about)]
pub struct Cli {
    /// Debug-level logging for this crate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run bandit policies over a price file
    Run(RunArgs),
    /// Write a synthetic price file
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Binary price file (u64 T, u64 N, T*N f64)
    pub file: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of thresholds
    #[arg(short = 't', long)]
    pub thresholds: Option<usize>,

    /// Maximum held items
    #[arg(short = 'm', long)]
    pub max_items: Option<u32>,

    /// UCB2 epoch growth
    #[arg(long)]
    pub alpha: Option<f64>,

    #[arg(long, env = "PROPHET_SEED")]
    pub seed: Option<u64>,

    /// Policies to run, comma separated
    #[arg(short, long = "policy", value_enum, value_delimiter = ',')]
    pub policies: Vec<PolicyKind>,

    /// Run every policy
    #[arg(short, long, conflicts_with = "policies")]
    pub all: bool,

    /// Also compute the local-extrema oracle (requires -m 1)
    #[arg(long)]
    pub extrema: bool,

    /// Directory for regret and best-hand CSV files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pipe regret and best-hand series to gnuplot
    #[arg(long)]
    pub plot: bool,
}

impl RunArgs {
    /// Command-line flags take precedence over file and environment.
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(k) = self.thresholds {
            config.bandit.thresholds = k;
        }
        if let Some(m) = self.max_items {
            config.bandit.max_items = m;
        }
        if let Some(alpha) = self.alpha {
            config.bandit.ucb2_alpha = alpha;
        }
        if self.seed.is_some() {
            config.bandit.seed = self.seed;
        }
        if self.all {
            config.bandit.policies = PolicyKind::ALL.to_vec();
        } else if !self.policies.is_empty() {
            config.bandit.policies = self.policies.clone();
        }
        if self.extrema {
            config.bandit.local_extrema = true;
        }
        if self.output.is_some() {
            config.report.output_dir = self.output.clone();
        }
        if self.plot {
            config.report.plot = true;
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, value_enum, default_value = "uniform")]
    pub model: ModelKind,

    /// phi, theta or frequency for the autoregressive, moving-average and
    /// sine models
    #[arg(long)]
    pub param: Option<f64>,

    /// Drift distribution parameters between rounds
    #[arg(short, long)]
    pub randomize: bool,

    /// Number of rounds
    #[arg(short = 't', long, default_value_t = 1000)]
    pub rounds: usize,

    /// Prices per round
    #[arg(short = 'n', long, default_value_t = 10)]
    pub prices: usize,

    /// Output path; defaults to prophetData/<model file name>
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub seed: Option<u64>,
}

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

use crate::{
    agent::{Bandit, PolicyKind, PolicyRun},
    config::BanditConfig,
    data::PriceSeries,
    environment::{RewardTable, compute_reward_table},
    error::Result,
    oracle::{OracleRun, find_best_hand, find_local_extrema_optimum},
    report::{Series, average_regret, best_hand_percentage},
};

/// Outcome of one benchmark: the shared reward table, both oracles and
/// every policy run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub table: RewardTable,
    pub best_hand: OracleRun,
    pub local_extrema: Option<OracleRun>,
    pub runs: Vec<PolicyRun>,
    pub seed: u64,
}

impl Evaluation {
    /// Average-regret series of every run against the best-hand oracle.
    pub fn regret_series(&self) -> Result<Vec<Series>> {
        self.runs
            .iter()
            .map(|run| -> Result<Series> {
                Ok(Series {
                    name: run.policy.to_string(),
                    values: average_regret(&self.best_hand.gains, &run.gains)?,
                })
            })
            .collect()
    }

    pub fn best_hand_series(&self) -> Result<Vec<Series>> {
        self.runs
            .iter()
            .map(|run| -> Result<Series> {
                Ok(Series {
                    name: run.policy.to_string(),
                    values: best_hand_percentage(&self.best_hand.gains, &run.gains)?,
                })
            })
            .collect()
    }
}

pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Normalizes `prices` in place, builds the reward table once and runs
/// every configured policy over it with its own seeded generator.
pub fn evaluate(prices: &mut PriceSeries, config: &BanditConfig) -> Result<Evaluation> {
    let seed = config.seed.unwrap_or_else(clock_seed);
    info!(seed, "starting evaluation");

    info!("normalizing prices to [0,1]");
    prices.normalize();

    info!(thresholds = config.thresholds, max_items = config.max_items, "calculating rewards");
    let table = compute_reward_table(prices, config.thresholds, config.max_items)?;

    info!("calculating optimal result (best hand)");
    let best_hand = find_best_hand(&table);

    let local_extrema = if config.local_extrema {
        info!("calculating optimal result (local extrema)");
        Some(find_local_extrema_optimum(prices, config.max_items)?)
    } else {
        None
    };

    let runs = run_policies(&table, &config.policies, config.ucb2_alpha, seed);

    Ok(Evaluation {
        table,
        best_hand,
        local_extrema,
        runs,
        seed,
    })
}

/// Runs each policy in `kinds` over `table`. Policy i draws from
/// `StdRng::seed_from_u64(seed + ordinal)`, so a fixed seed reproduces
/// every run.
pub fn run_policies(
    table: &RewardTable,
    kinds: &[PolicyKind],
    ucb2_alpha: f64,
    seed: u64,
) -> Vec<PolicyRun> {
    let bandit = Bandit::new(table);
    kinds
        .iter()
        .map(|&kind| {
            let policy = kind.build(ucb2_alpha);
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(kind.ordinal()));
            let start = Instant::now();
            info!(policy = policy.name(), "calculating");
            let run = policy.run(&bandit, &mut rng);
            info!(
                policy = policy.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                total_gain = run.gains.total(),
                "finished"
            );
            run
        })
        .collect()
}

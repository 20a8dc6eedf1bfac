use clap::ValueEnum;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    environment::{RewardBounds, RewardTable},
    policies::{
        epsilon_greedy::EpsilonGreedy, exp3::Exp3, greedy::Greedy,
        successive_elimination::SuccessiveElimination, ucb1::Ucb1, ucb2::Ucb2,
    },
    state::{GainCurve, ThresholdStats},
};

/// Read-only inputs shared by every policy run over one reward table.
#[derive(Debug, Clone, Copy)]
pub struct Bandit<'a> {
    pub table: &'a RewardTable,
    /// Global reward range of `table`, computed once.
    pub bounds: RewardBounds,
}

impl<'a> Bandit<'a> {
    pub fn new(table: &'a RewardTable) -> Self {
        Self {
            table,
            bounds: table.bounds(),
        }
    }

    pub fn thresholds(&self) -> usize {
        self.table.thresholds()
    }

    pub fn rounds(&self) -> usize {
        self.table.rounds()
    }
}

/// An online threshold-selection strategy. One call to `run` plays every
/// round of the table once, starting from fresh statistics.
pub trait BanditPolicy {
    fn name(&self) -> &'static str;

    fn run(&self, bandit: &Bandit<'_>, rng: &mut dyn RngCore) -> PolicyRun;
}

/// Everything a policy hands back for reporting.
#[derive(Debug, Clone)]
pub struct PolicyRun {
    pub policy: &'static str,
    pub gains: GainCurve,
    pub arms: Vec<ThresholdStats>,
    pub diagnostics: Diagnostics,
}

/// Algorithm-specific state captured at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostics {
    None,
    EpsilonGreedy {
        explored: u64,
        exploited: u64,
        /// Explore probability the schedule would use after the last round.
        final_explore_prob: f64,
    },
    SuccessiveElimination {
        upper: Vec<f64>,
        lower: Vec<f64>,
        active: Vec<bool>,
        /// Active-arm count after each elimination round.
        active_history: Vec<usize>,
    },
    Ucb1 {
        upper: Vec<f64>,
    },
    Ucb2 {
        upper: Vec<f64>,
        epochs: Vec<u32>,
    },
    Exp3 {
        /// Natural log of each arm's weight.
        log_weights: Vec<f64>,
        probabilities: Vec<f64>,
        final_gamma: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    Greedy,
    EpsilonGreedy,
    SuccessiveElimination,
    Ucb1,
    Ucb2,
    Exp3,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 6] = [
        PolicyKind::Greedy,
        PolicyKind::EpsilonGreedy,
        PolicyKind::SuccessiveElimination,
        PolicyKind::Ucb1,
        PolicyKind::Ucb2,
        PolicyKind::Exp3,
    ];

    pub fn build(self, ucb2_alpha: f64) -> Box<dyn BanditPolicy> {
        match self {
            PolicyKind::Greedy => Box::new(Greedy),
            PolicyKind::EpsilonGreedy => Box::new(EpsilonGreedy),
            PolicyKind::SuccessiveElimination => Box::new(SuccessiveElimination),
            PolicyKind::Ucb1 => Box::new(Ucb1),
            PolicyKind::Ucb2 => Box::new(Ucb2::new(ucb2_alpha)),
            PolicyKind::Exp3 => Box::new(Exp3),
        }
    }

    /// Position in `ALL`, used to derive per-policy seeds.
    pub fn ordinal(self) -> u64 {
        Self::ALL.iter().position(|&k| k == self).unwrap_or(0) as u64
    }
}

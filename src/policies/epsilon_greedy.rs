use rand::{Rng, RngCore};
use tracing::debug;

use crate::{
    agent::{Bandit, BanditPolicy, Diagnostics, PolicyRun},
    state::{Ledger, argmax},
};

/// Toss a coin with success probability e_t each round: on success pick a
/// threshold uniformly at random, otherwise the best average so far.
///
/// e_t = (K ln(t+1) / (t+1))^(1/3) gives the O(t^(2/3) (K ln t)^(1/3))
/// regret bound. It is 0 at t = 0, so the first round always exploits and
/// falls back to threshold 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsilonGreedy;

impl EpsilonGreedy {
    pub fn explore_probability(round: usize, total_thresholds: usize) -> f64 {
        let elapsed = (round + 1) as f64;
        (total_thresholds as f64 * elapsed.ln() / elapsed)
            .cbrt()
            .clamp(0.0, 1.0)
    }
}

impl BanditPolicy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        "Epsilon-Greedy"
    }

    fn run(&self, bandit: &Bandit<'_>, rng: &mut dyn RngCore) -> PolicyRun {
        let k = bandit.thresholds();
        let mut ledger = Ledger::new(bandit.table);
        let mut explored = 0;
        let mut exploited = 0;

        while !ledger.exhausted() {
            let epsilon = Self::explore_probability(ledger.round(), k);
            let chosen = if rng.random::<f64>() < epsilon {
                explored += 1;
                rng.random_range(0..k)
            } else {
                exploited += 1;
                argmax(ledger.arms.iter().map(|a| a.avg_reward))
            };
            ledger.play(chosen);
        }

        debug!(explored, exploited, "epsilon-greedy finished");

        let final_explore_prob = Self::explore_probability(bandit.rounds(), k);
        let (gains, arms) = ledger.into_parts();
        PolicyRun {
            policy: self.name(),
            gains,
            arms,
            diagnostics: Diagnostics::EpsilonGreedy {
                explored,
                exploited,
                final_explore_prob,
            },
        }
    }
}

use rand::RngCore;
use tracing::debug;

use crate::{
    agent::{Bandit, BanditPolicy, Diagnostics, PolicyRun},
    policies::confidence_radius,
    state::Ledger,
};

/// Sweep the active thresholds once each, then drop every threshold whose
/// upper confidence bound lies strictly below the best lower bound.
/// Repeats until the round budget is spent; dropped thresholds never
/// come back.
///
/// Bounds use the average reward rescaled into [0, 1] by the table's
/// global range, plus or minus sqrt(2 ln(t+1) / n).
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessiveElimination;

impl BanditPolicy for SuccessiveElimination {
    fn name(&self) -> &'static str {
        "Successive Elimination"
    }

    fn run(&self, bandit: &Bandit<'_>, _rng: &mut dyn RngCore) -> PolicyRun {
        let k = bandit.thresholds();
        let mut ledger = Ledger::new(bandit.table);
        let mut active = vec![true; k];
        let mut upper = vec![f64::INFINITY; k];
        let mut lower = vec![f64::NEG_INFINITY; k];
        let mut active_history = Vec::new();

        while !ledger.exhausted() {
            for arm in 0..k {
                if ledger.exhausted() {
                    break;
                }
                if active[arm] {
                    ledger.play(arm);
                }
            }

            let t = ledger.round();
            let mut max_lower = f64::NEG_INFINITY;
            for (arm, stats) in ledger.arms.iter().enumerate() {
                if !active[arm] {
                    continue;
                }
                let mean = bandit.bounds.normalize(stats.avg_reward);
                let radius = confidence_radius(t, stats.times_chosen);
                upper[arm] = mean + radius;
                lower[arm] = mean - radius;
                max_lower = max_lower.max(lower[arm]);
            }

            for arm in 0..k {
                if active[arm] && upper[arm] < max_lower {
                    active[arm] = false;
                    debug!(arm, round = t, "threshold eliminated");
                }
            }
            active_history.push(active.iter().filter(|&&a| a).count());
        }

        let (gains, arms) = ledger.into_parts();
        PolicyRun {
            policy: self.name(),
            gains,
            arms,
            diagnostics: Diagnostics::SuccessiveElimination {
                upper,
                lower,
                active,
                active_history,
            },
        }
    }
}

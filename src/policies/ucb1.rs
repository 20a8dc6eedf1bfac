use rand::RngCore;

use crate::{
    agent::{Bandit, BanditPolicy, Diagnostics, PolicyRun},
    policies::{confidence_radius, seed_each_arm},
    state::{Ledger, argmax},
};

/// Try each threshold once, then every round play the threshold with the
/// highest UCB = average reward + sqrt(2 ln(t+1) / n). Raw averages, no
/// rescaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ucb1;

impl Ucb1 {
    pub fn upper_bounds(ledger: &Ledger<'_>) -> Vec<f64> {
        let t = ledger.round();
        ledger
            .arms
            .iter()
            .map(|a| a.avg_reward + confidence_radius(t, a.times_chosen))
            .collect()
    }
}

impl BanditPolicy for Ucb1 {
    fn name(&self) -> &'static str {
        "UCB1"
    }

    fn run(&self, bandit: &Bandit<'_>, _rng: &mut dyn RngCore) -> PolicyRun {
        let mut ledger = Ledger::new(bandit.table);
        seed_each_arm(&mut ledger);

        let mut upper = vec![f64::INFINITY; bandit.thresholds()];
        while !ledger.exhausted() {
            upper = Self::upper_bounds(&ledger);
            let chosen = argmax(upper.iter().copied());
            ledger.play(chosen);
        }

        let (gains, arms) = ledger.into_parts();
        PolicyRun {
            policy: self.name(),
            gains,
            arms,
            diagnostics: Diagnostics::Ucb1 { upper },
        }
    }
}

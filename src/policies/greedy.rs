use rand::RngCore;

use crate::{
    agent::{Bandit, BanditPolicy, Diagnostics, PolicyRun},
    policies::seed_each_arm,
    state::{Ledger, argmax},
};

/// Try each threshold once, then always play the best average so far.
/// No exploration after seeding, so a misleading first sample sticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl BanditPolicy for Greedy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn run(&self, bandit: &Bandit<'_>, _rng: &mut dyn RngCore) -> PolicyRun {
        let mut ledger = Ledger::new(bandit.table);
        seed_each_arm(&mut ledger);

        while !ledger.exhausted() {
            let chosen = argmax(ledger.arms.iter().map(|a| a.avg_reward));
            ledger.play(chosen);
        }

        let (gains, arms) = ledger.into_parts();
        PolicyRun {
            policy: self.name(),
            gains,
            arms,
            diagnostics: Diagnostics::None,
        }
    }
}

use std::f64::consts::E;

use rand::RngCore;
use tracing::debug;

use crate::{
    agent::{Bandit, BanditPolicy, Diagnostics, PolicyRun},
    policies::seed_each_arm,
    state::{Ledger, argmax},
};

pub const DEFAULT_ALPHA: f64 = 0.3;

/// UCB1 played in epochs. Bounds are recomputed only between bursts; the
/// chosen threshold is then replayed for a whole burst whose length grows
/// geometrically with the number of epochs it has already won.
///
/// With r_k epochs won by threshold k and τ(r) = ceil((1+α)^r):
///
/// UCB_k = avg_k + sqrt((1+α) ln(e (t+1) / τ(r_k)) / (2 τ(r_k)))
///
/// where avg_k is rescaled into [0, 1] by the table's global range.
#[derive(Debug, Clone, Copy)]
pub struct Ucb2 {
    alpha: f64,
}

impl Default for Ucb2 {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl Ucb2 {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn tau(&self, epoch: u32) -> f64 {
        (1.0 + self.alpha).powf(epoch as f64).ceil()
    }

    /// Rounds played by a threshold that wins its `epoch`-th burst: the
    /// growth (1+α)^(r+1) − (1+α)^r rounded up. At least 1 and
    /// non-decreasing in `epoch`.
    ///
    /// This is not τ(r+1) − τ(r) taken after the epoch increment, the
    /// usual UCB2 schedule: for α = 0.3 that difference runs 0, 1, 0, 1, 1
    /// over r = 0..5 while this one runs 1, 1, 1, 1, 1.
    pub fn burst_length(&self, epoch: u32) -> u64 {
        let growth = self.alpha * (1.0 + self.alpha).powf(epoch as f64);
        growth.ceil().clamp(1.0, u64::MAX as f64) as u64
    }

    pub fn bonus(&self, round: usize, epoch: u32) -> f64 {
        let tau = self.tau(epoch);
        let log_term = (E * (round + 1) as f64 / tau).ln().max(0.0);
        ((1.0 + self.alpha) * log_term / (2.0 * tau)).sqrt()
    }
}

impl BanditPolicy for Ucb2 {
    fn name(&self) -> &'static str {
        "UCB2"
    }

    fn run(&self, bandit: &Bandit<'_>, _rng: &mut dyn RngCore) -> PolicyRun {
        let k = bandit.thresholds();
        let mut ledger = Ledger::new(bandit.table);
        let mut epochs = vec![0u32; k];
        let mut upper = vec![f64::INFINITY; k];

        seed_each_arm(&mut ledger);

        while !ledger.exhausted() {
            let t = ledger.round();
            for (arm, stats) in ledger.arms.iter().enumerate() {
                upper[arm] = bandit.bounds.normalize(stats.avg_reward) + self.bonus(t, epochs[arm]);
            }
            let chosen = argmax(upper.iter().copied());

            let burst = self.burst_length(epochs[chosen]);
            epochs[chosen] += 1;
            debug!(arm = chosen, burst, round = t, "ucb2 epoch");

            for _ in 0..burst {
                if ledger.exhausted() {
                    break;
                }
                ledger.play(chosen);
            }
        }

        let (gains, arms) = ledger.into_parts();
        PolicyRun {
            policy: self.name(),
            gains,
            arms,
            diagnostics: Diagnostics::Ucb2 { upper, epochs },
        }
    }
}

/// Mean burst length for a threshold, zero if it never won an epoch.
pub fn average_epoch_duration(times_chosen: u64, epochs: u32) -> f64 {
    if epochs == 0 {
        0.0
    } else {
        times_chosen as f64 / epochs as f64
    }
}

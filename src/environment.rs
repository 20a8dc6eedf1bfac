use tracing::debug;

use crate::{
    data::PriceSeries,
    error::{BanditError, Result},
};

/// Dense T×K table: entry (t, k) is what a fixed-threshold trader using
/// threshold k would have earned in round t alone. Row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardTable {
    rounds: usize,
    thresholds: usize,
    rewards: Vec<f64>,
}

impl RewardTable {
    pub fn new(rounds: usize, thresholds: usize, rewards: Vec<f64>) -> Result<Self> {
        if rounds == 0 || thresholds == 0 {
            return Err(BanditError::InvalidDimensions(format!(
                "reward table needs T > 0 and K > 0, got T={rounds} K={thresholds}"
            )));
        }
        if rewards.len() != rounds * thresholds {
            return Err(BanditError::InvalidDimensions(format!(
                "expected {} rewards for T={rounds} K={thresholds}, got {}",
                rounds * thresholds,
                rewards.len()
            )));
        }
        Ok(Self {
            rounds,
            thresholds,
            rewards,
        })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let thresholds = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != thresholds) {
            return Err(BanditError::InvalidDimensions(
                "every round must hold a reward for each threshold".to_string(),
            ));
        }
        Self::new(rows.len(), thresholds, rows.iter().flatten().copied().collect())
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn thresholds(&self) -> usize {
        self.thresholds
    }

    pub fn reward(&self, round: usize, threshold: usize) -> f64 {
        self.rewards[self.thresholds * round + threshold]
    }

    pub fn row(&self, round: usize) -> &[f64] {
        let start = self.thresholds * round;
        &self.rewards[start..start + self.thresholds]
    }

    pub fn column(&self, threshold: usize) -> impl Iterator<Item = f64> + '_ {
        self.rewards
            .iter()
            .skip(threshold)
            .step_by(self.thresholds)
            .copied()
    }

    /// Global min/max over the whole table. Computed once per table and
    /// shared by every policy that rescales rewards.
    pub fn bounds(&self) -> RewardBounds {
        let (min, max) = self
            .rewards
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                (lo.min(r), hi.max(r))
            });
        RewardBounds { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardBounds {
    pub min: f64,
    pub max: f64,
}

impl RewardBounds {
    /// Maps a reward into [0, 1]. A degenerate range maps everything to 0.
    pub fn normalize(&self, reward: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            (reward - self.min) / span
        } else {
            0.0
        }
    }
}

/// Replays normalized price rounds for a fixed-threshold trader that can
/// hold up to `max_items` units at once.
pub struct Environment<'a> {
    prices: &'a PriceSeries,
    max_items: u32,
}

impl<'a> Environment<'a> {
    pub fn new(prices: &'a PriceSeries, max_items: u32) -> Self {
        Self { prices, max_items }
    }

    /// Trades one round at threshold value `threshold`, starting with
    /// `held` units. Returns the net gain and the units still held.
    ///
    /// A unit is sold when the price reaches the threshold or when the
    /// positions left in the round equal the units held (forced
    /// liquidation). A unit is bought below the threshold if capacity
    /// allows and it could still be liquidated before the round ends.
    pub fn replay_round(&self, round: usize, threshold: f64, mut held: u32) -> (f64, u32) {
        let prices = self.prices.round(round);
        let len = prices.len();
        let mut gain = 0.0;

        for (n, &price) in prices.iter().enumerate() {
            let remaining = (len - n) as u64;
            if held > 0 && (remaining == held as u64 || price >= threshold) {
                gain += price;
                held -= 1;
            } else if remaining - 1 != held as u64 && price < threshold && held < self.max_items {
                gain -= price;
                held += 1;
            }
        }
        (gain, held)
    }

    /// Builds the T×K reward table for thresholds k/K, k = 0..K.
    ///
    /// The held counter is carried from one round into the next for a
    /// fixed threshold and reset between thresholds. Forced liquidation
    /// empties it by the end of every round, so the carry never changes
    /// a reward.
    pub fn reward_table(&self, total_thresholds: usize) -> Result<RewardTable> {
        if total_thresholds == 0 {
            return Err(BanditError::InvalidDimensions(
                "at least one threshold is required".to_string(),
            ));
        }
        if self.prices.prices_per_round() < 2 {
            return Err(BanditError::InvalidDimensions(format!(
                "a round needs at least two prices to buy and sell, got {}",
                self.prices.prices_per_round()
            )));
        }

        let rounds = self.prices.rounds();
        let mut rewards = vec![0.0; rounds * total_thresholds];

        for k in 0..total_thresholds {
            let threshold = k as f64 / total_thresholds as f64;
            let mut held = 0;
            for t in 0..rounds {
                let (gain, left) = self.replay_round(t, threshold, held);
                held = left;
                rewards[total_thresholds * t + k] = gain;
            }
            debug!(threshold, carried = held, "threshold replayed");
        }

        RewardTable::new(rounds, total_thresholds, rewards)
    }
}

/// Convenience wrapper: reward table for `prices` (already normalized to
/// [0, 1]) with K thresholds and capacity M.
pub fn compute_reward_table(
    prices: &PriceSeries,
    total_thresholds: usize,
    max_items: u32,
) -> Result<RewardTable> {
    Environment::new(prices, max_items).reward_table(total_thresholds)
}

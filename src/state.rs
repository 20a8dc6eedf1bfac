use crate::environment::RewardTable;

/// Running statistics of one threshold (arm) during a single policy run.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdStats {
    /// Position of the threshold in [0, 1).
    pub threshold: f64,
    pub reward_sum: f64,
    pub times_chosen: u64,
    /// `reward_sum / times_chosen`, zero until the arm is first played.
    pub avg_reward: f64,
}

impl ThresholdStats {
    pub fn new(index: usize, total_thresholds: usize) -> Self {
        Self {
            threshold: index as f64 / total_thresholds as f64,
            reward_sum: 0.0,
            times_chosen: 0,
            avg_reward: 0.0,
        }
    }

    /// Fresh statistics for all K thresholds.
    pub fn fresh(total_thresholds: usize) -> Vec<Self> {
        (0..total_thresholds)
            .map(|k| Self::new(k, total_thresholds))
            .collect()
    }

    pub fn record(&mut self, gain: f64) {
        self.reward_sum += gain;
        self.times_chosen += 1;
        self.avg_reward = self.reward_sum / self.times_chosen as f64;
    }
}

/// Per-round realized gain and its running sum.
///
/// `cumulative[0] == per_round[0]` and
/// `cumulative[t] == cumulative[t - 1] + per_round[t]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GainCurve {
    pub per_round: Vec<f64>,
    pub cumulative: Vec<f64>,
}

impl GainCurve {
    pub fn with_capacity(rounds: usize) -> Self {
        Self {
            per_round: Vec::with_capacity(rounds),
            cumulative: Vec::with_capacity(rounds),
        }
    }

    pub fn push(&mut self, gain: f64) {
        let total = self.cumulative.last().copied().unwrap_or(0.0) + gain;
        self.per_round.push(gain);
        self.cumulative.push(total);
    }

    pub fn len(&self) -> usize {
        self.per_round.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_round.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}

/// Bookkeeping shared by every policy: one round = read the table cell,
/// credit the arm, extend the curve.
#[derive(Debug, Clone)]
pub struct Ledger<'a> {
    table: &'a RewardTable,
    pub arms: Vec<ThresholdStats>,
    pub curve: GainCurve,
}

impl<'a> Ledger<'a> {
    pub fn new(table: &'a RewardTable) -> Self {
        Self {
            table,
            arms: ThresholdStats::fresh(table.thresholds()),
            curve: GainCurve::with_capacity(table.rounds()),
        }
    }

    /// Next global round index, equal to the number of rounds played.
    pub fn round(&self) -> usize {
        self.curve.len()
    }

    pub fn exhausted(&self) -> bool {
        self.round() >= self.table.rounds()
    }

    pub fn table(&self) -> &'a RewardTable {
        self.table
    }

    /// Plays `arm` in the current round and returns the realized gain.
    pub fn play(&mut self, arm: usize) -> f64 {
        let gain = self.table.reward(self.round(), arm);
        self.arms[arm].record(gain);
        self.curve.push(gain);
        gain
    }

    pub fn into_parts(self) -> (GainCurve, Vec<ThresholdStats>) {
        (self.curve, self.arms)
    }
}

/// Index of the largest value, scanning left to right with a strict `>`
/// so the lowest index wins ties. NaN never wins. Returns 0 for an
/// all-NaN or empty input.
pub fn argmax<I>(values: I) -> usize
where
    I: IntoIterator<Item = f64>,
{
    let mut best = 0;
    let mut max = f64::NEG_INFINITY;
    for (k, v) in values.into_iter().enumerate() {
        if v > max {
            max = v;
            best = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_average_in_sync() {
        let mut stats = ThresholdStats::new(3, 10);
        assert_eq!(stats.threshold, 0.3);
        stats.record(1.0);
        stats.record(2.0);
        assert_eq!(stats.times_chosen, 2);
        assert_eq!(stats.reward_sum, 3.0);
        assert_eq!(stats.avg_reward, 1.5);
    }

    #[test]
    fn curve_is_exact_prefix_sum() {
        let mut curve = GainCurve::default();
        for g in [0.5, -0.25, 2.0, 0.0] {
            curve.push(g);
        }
        assert_eq!(curve.cumulative[0], curve.per_round[0]);
        for t in 1..curve.len() {
            assert_eq!(curve.cumulative[t], curve.cumulative[t - 1] + curve.per_round[t]);
        }
        assert_eq!(curve.total(), 2.25);
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax([1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax([f64::NAN, 0.5, f64::NAN]), 1);
        assert_eq!(argmax(std::iter::empty()), 0);
        assert_eq!(argmax([-5.0, -5.0]), 0);
    }
}

use std::f64::consts::E;

use rand::{Rng, RngCore};
use tracing::debug;

use crate::{
    agent::{Bandit, BanditPolicy, Diagnostics, PolicyRun},
    state::Ledger,
};

/// Exponential weights for exploration and exploitation.
///
/// Every round, threshold k is drawn with probability
///
/// p_k = (1 − γ_t) w_k / Σw + γ_t / K
///
/// and only the drawn threshold's weight is updated, with its reward
/// rescaled into [0, 1] and divided by p_k so the estimate stays unbiased
/// under bandit feedback:
///
/// w_k ← w_k · exp(γ_t · x̂_k / K)
///
/// The horizon is unknown, so γ_t = min(1, sqrt(K ln K / ((e − 1)(t + 1))))
/// uses the elapsed rounds in its place.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exp3;

impl Exp3 {
    pub fn gamma(round: usize, total_thresholds: usize) -> f64 {
        let k = total_thresholds as f64;
        ((k * k.ln()) / ((E - 1.0) * (round + 1) as f64))
            .sqrt()
            .min(1.0)
    }
}

/// Arm weights kept as natural logs. Weights only ever grow by factors of
/// exp(positive), which would overflow an f64 long before a run ends;
/// in log space they stay finite and the distribution is recovered with a
/// max shift.
#[derive(Debug, Clone, PartialEq)]
pub struct Exp3Weights {
    log_weights: Vec<f64>,
}

impl Exp3Weights {
    /// All weights start at 1.
    pub fn new(total_thresholds: usize) -> Self {
        Self {
            log_weights: vec![0.0; total_thresholds],
        }
    }

    pub fn log_weights(&self) -> &[f64] {
        &self.log_weights
    }

    /// Selection probabilities for exploration rate `gamma`.
    pub fn probabilities(&self, gamma: f64) -> Vec<f64> {
        let k = self.log_weights.len() as f64;
        let shift = self
            .log_weights
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let scaled: Vec<f64> = self.log_weights.iter().map(|lw| (lw - shift).exp()).collect();
        let total: f64 = scaled.iter().sum();
        scaled
            .into_iter()
            .map(|w| (1.0 - gamma) * (w / total) + gamma / k)
            .collect()
    }

    /// Walks the distribution with a uniform draw in [0, 1). Returns the
    /// arm and its probability; floating-point drift that leaves part of
    /// the draw unconsumed lands on the last arm.
    pub fn sample(probabilities: &[f64], mut draw: f64) -> (usize, f64) {
        for (arm, &p) in probabilities.iter().enumerate() {
            if draw < p {
                return (arm, p);
            }
            draw -= p;
        }
        let last = probabilities.len() - 1;
        (last, probabilities[last])
    }

    /// Importance-weighted update of the drawn arm. Other arms implicitly
    /// observed a zero gain and keep their weight.
    pub fn update(&mut self, arm: usize, normalized_gain: f64, probability: f64, gamma: f64) {
        let k = self.log_weights.len() as f64;
        let estimate = normalized_gain / probability;
        self.log_weights[arm] += gamma * estimate / k;
    }
}

impl BanditPolicy for Exp3 {
    fn name(&self) -> &'static str {
        "EXP3"
    }

    fn run(&self, bandit: &Bandit<'_>, rng: &mut dyn RngCore) -> PolicyRun {
        let k = bandit.thresholds();
        let mut ledger = Ledger::new(bandit.table);
        let mut weights = Exp3Weights::new(k);
        let mut gamma = Self::gamma(0, k);

        while !ledger.exhausted() {
            gamma = Self::gamma(ledger.round(), k);
            let probabilities = weights.probabilities(gamma);
            let (chosen, probability) = Exp3Weights::sample(&probabilities, rng.random::<f64>());

            let gain = ledger.play(chosen);
            weights.update(chosen, bandit.bounds.normalize(gain), probability, gamma);
        }

        debug!(final_gamma = gamma, "exp3 finished");

        let probabilities = weights.probabilities(gamma);
        let (gains, arms) = ledger.into_parts();
        PolicyRun {
            policy: self.name(),
            gains,
            arms,
            diagnostics: Diagnostics::Exp3 {
                log_weights: weights.log_weights,
                probabilities,
                final_gamma: gamma,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{environment::RewardTable, policies::fixtures::skewed_table};

    #[test]
    fn gamma_decays_from_one() {
        assert_eq!(Exp3::gamma(0, 10), 1.0);
        assert!(Exp3::gamma(10_000, 10) < Exp3::gamma(1_000, 10));
        // ln 1 = 0: nothing to explore
        assert_eq!(Exp3::gamma(5, 1), 0.0);
    }

    #[test]
    fn probabilities_form_a_distribution() {
        let mut weights = Exp3Weights::new(4);
        weights.update(2, 1.0, 0.25, 0.5);
        let probs = weights.probabilities(0.2);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs.iter().all(|&p| p >= 0.2 / 4.0 - 1e-15));
        assert!(probs[2] > probs[0]);
    }

    #[test]
    fn update_adds_importance_weighted_step() {
        let mut weights = Exp3Weights::new(4);
        // gamma * (x / p) / K = 0.5 * (1 / 0.25) / 4
        weights.update(2, 1.0, 0.25, 0.5);
        assert_eq!(weights.log_weights(), &[0.0, 0.0, 0.5, 0.0]);

        weights.update(0, 0.3, 0.5, 0.2);
        assert!((weights.log_weights()[0] - 0.2 * 0.6 / 4.0).abs() < 1e-15);

        let probs = weights.probabilities(0.2);
        let w = [0.03f64.exp(), 1.0, 0.5f64.exp(), 1.0];
        let total: f64 = w.iter().sum();
        for (p, wk) in probs.iter().zip(w) {
            assert!((p - (0.8 * wk / total + 0.05)).abs() < 1e-12);
        }
    }

    #[test]
    fn run_matches_plain_weight_reference() {
        let table = RewardTable::from_rows(&[
            vec![0.2, -0.1, 0.6],
            vec![0.4, 0.9, 0.0],
            vec![-0.3, 0.5, 0.7],
            vec![0.8, 0.1, 0.3],
            vec![0.0, 0.6, -0.2],
            vec![0.5, 0.2, 0.9],
        ])
        .unwrap();
        let bandit = Bandit::new(&table);
        let run = Exp3.run(&bandit, &mut StdRng::seed_from_u64(21));

        // same draws, weights kept as plain numbers
        let mut rng = StdRng::seed_from_u64(21);
        let (min, max) = (bandit.bounds.min, bandit.bounds.max);
        let mut w = [1.0f64; 3];
        let mut expected = Vec::new();
        for t in 0..table.rounds() {
            let gamma = (3.0 * 3f64.ln() / ((E - 1.0) * (t + 1) as f64)).sqrt().min(1.0);
            let total: f64 = w.iter().sum();
            let p: Vec<f64> = w.iter().map(|wk| (1.0 - gamma) * wk / total + gamma / 3.0).collect();
            let mut draw: f64 = rng.random();
            let mut arm = 2;
            for (k, &pk) in p.iter().enumerate() {
                if draw < pk {
                    arm = k;
                    break;
                }
                draw -= pk;
            }
            let x = table.reward(t, arm);
            expected.push(x);
            w[arm] *= (gamma * ((x - min) / (max - min)) / p[arm] / 3.0).exp();
        }

        assert_eq!(run.gains.per_round, expected);
        let Diagnostics::Exp3 { log_weights, .. } = &run.diagnostics else {
            panic!("wrong diagnostics variant");
        };
        for (lw, wk) in log_weights.iter().zip(w) {
            assert!((lw - wk.ln()).abs() < 1e-9);
        }
    }

    #[test]
    fn sample_walks_in_index_order_with_fallback() {
        let probs = [0.2, 0.3, 0.5];
        assert_eq!(Exp3Weights::sample(&probs, 0.0).0, 0);
        assert_eq!(Exp3Weights::sample(&probs, 0.25).0, 1);
        assert_eq!(Exp3Weights::sample(&probs, 0.75).0, 2);
        // drift: draw not consumed by the walk
        let short = [0.2, 0.3, 0.4999];
        assert_eq!(Exp3Weights::sample(&short, 0.99995), (2, 0.4999));
    }

    #[test]
    fn weights_stay_positive_over_long_runs() {
        let table = skewed_table(20_000, 5, 0);
        let bandit = Bandit::new(&table);
        let mut rng = StdRng::seed_from_u64(11);
        let mut ledger = Ledger::new(&table);
        let mut weights = Exp3Weights::new(5);

        while !ledger.exhausted() {
            let gamma = Exp3::gamma(ledger.round(), 5);
            let probs = weights.probabilities(gamma);
            assert!(probs.iter().all(|p| p.is_finite() && *p > 0.0));
            let (arm, p) = Exp3Weights::sample(&probs, rng.random::<f64>());
            let gain = ledger.play(arm);
            weights.update(arm, bandit.bounds.normalize(gain), p, gamma);
            // weight >= 1 <=> log weight >= 0
            assert!(weights.log_weights().iter().all(|lw| lw.is_finite() && *lw >= 0.0));
        }
    }

    #[test]
    fn survives_weights_beyond_f64_range() {
        let mut weights = Exp3Weights::new(3);
        weights.update(1, 1.0, 1e-6, 1.0);
        weights.update(1, 1.0, 1e-6, 1.0);
        // exp(6.6e5) overflows f64 but the log stays finite
        assert!(weights.log_weights()[1] > 700.0);
        let probs = weights.probabilities(0.1);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[1] - (0.9 + 0.1 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn run_produces_full_curve_and_favours_best() {
        let table = skewed_table(5000, 4, 0);
        let run = Exp3.run(&Bandit::new(&table), &mut StdRng::seed_from_u64(3));
        assert_eq!(run.gains.len(), 5000);
        let Diagnostics::Exp3 { log_weights, probabilities, .. } = &run.diagnostics else {
            panic!("wrong diagnostics variant");
        };
        assert!(log_weights.iter().all(|lw| lw.is_finite() && *lw >= 0.0));
        assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let best = run.arms[0].times_chosen;
        assert!(run.arms.iter().all(|a| a.times_chosen <= best));
    }

    #[test]
    fn same_seed_same_choices() {
        let table = RewardTable::from_rows(&[
            vec![0.1, 0.9, 0.4],
            vec![0.3, 0.2, 0.8],
            vec![0.5, 0.5, 0.5],
            vec![0.9, 0.0, 0.1],
        ])
        .unwrap();
        let bandit = Bandit::new(&table);
        let a = Exp3.run(&bandit, &mut StdRng::seed_from_u64(99));
        let b = Exp3.run(&bandit, &mut StdRng::seed_from_u64(99));
        assert_eq!(a.gains, b.gains);
        assert_eq!(a.diagnostics, b.diagnostics);
    }
}

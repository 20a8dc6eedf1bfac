//! Synthetic price series for benchmarking.

use std::f64::consts::PI;

use clap::ValueEnum;
use rand::{Rng, RngCore};
use rand_distr::{Bernoulli, Distribution, Exp, Normal};

use crate::{
    data::PriceSeries,
    error::{BanditError, Result},
};

/// Smallest exponential mean reachable through drift.
const MIN_EXP_MEAN: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    Uniform,
    Gaussian,
    Exponential,
    Bernoulli,
    Autoregressive,
    MovingAverage,
    Sine,
    SteepSine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceModel {
    /// U[0, 1)
    Uniform,
    /// N(0, 1)
    Gaussian,
    /// Exponential with mean 1
    Exponential,
    /// Bernoulli(0.5)
    Bernoulli,
    /// x_i = phi * x_{i-1} + N(0, 1)
    Autoregressive { phi: f64 },
    /// x_i = e_i + theta * e_{i-1}
    MovingAverage { theta: f64 },
    /// 5 sin(2 pi f i / (T N)) + N(0, 1)
    Sine { frequency: f64 },
    /// 5 cbrt(sin(2 pi f i / (T N))) + N(0, 1)
    SteepSine { frequency: f64 },
}

impl PriceModel {
    /// `param` feeds phi, theta or the frequency and defaults to 1.
    pub fn from_kind(kind: ModelKind, param: Option<f64>) -> Self {
        let p = param.unwrap_or(1.0);
        match kind {
            ModelKind::Uniform => PriceModel::Uniform,
            ModelKind::Gaussian => PriceModel::Gaussian,
            ModelKind::Exponential => PriceModel::Exponential,
            ModelKind::Bernoulli => PriceModel::Bernoulli,
            ModelKind::Autoregressive => PriceModel::Autoregressive { phi: p },
            ModelKind::MovingAverage => PriceModel::MovingAverage { theta: p },
            ModelKind::Sine => PriceModel::Sine { frequency: p },
            ModelKind::SteepSine => PriceModel::SteepSine { frequency: p },
        }
    }

    fn letter(&self) -> char {
        match self {
            PriceModel::Uniform => 'u',
            PriceModel::Gaussian => 'g',
            PriceModel::Exponential => 'e',
            PriceModel::Bernoulli => 'b',
            PriceModel::Autoregressive { .. } => 'a',
            PriceModel::MovingAverage { .. } => 'm',
            PriceModel::Sine { .. } => 's',
            PriceModel::SteepSine { .. } => 'c',
        }
    }

    /// Only the four i.i.d. models support parameter drift.
    pub fn supports_drift(&self) -> bool {
        matches!(
            self,
            PriceModel::Uniform | PriceModel::Gaussian | PriceModel::Exponential | PriceModel::Bernoulli
        )
    }

    /// e.g. `udataT1000N10.dat`, `urdataT1000N10.dat`, `adataP0.5T1000N10.dat`.
    pub fn file_name(&self, randomize: bool, rounds: usize, prices_per_round: usize) -> String {
        let letter = self.letter();
        match self {
            PriceModel::Autoregressive { phi: p }
            | PriceModel::Sine { frequency: p }
            | PriceModel::SteepSine { frequency: p } => {
                format!("{letter}dataP{p}T{rounds}N{prices_per_round}.dat")
            }
            _ if randomize && self.supports_drift() => {
                format!("{letter}rdataT{rounds}N{prices_per_round}.dat")
            }
            _ => format!("{letter}dataT{rounds}N{prices_per_round}.dat"),
        }
    }
}

fn invalid(name: &'static str, reason: impl ToString) -> BanditError {
    BanditError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

/// Samples T rounds of N prices. With `randomize`, the i.i.d. models drift
/// their parameters between rounds.
pub fn generate(
    model: PriceModel,
    randomize: bool,
    rounds: usize,
    prices_per_round: usize,
    rng: &mut dyn RngCore,
) -> Result<PriceSeries> {
    let total = rounds * prices_per_round;
    let std_normal = Normal::new(0.0, 1.0).map_err(|e| invalid("sigma", e))?;
    let drift = randomize && model.supports_drift();
    let mut prices = Vec::with_capacity(total);

    match model {
        PriceModel::Uniform => {
            let (mut low, mut high) = (0.0, 1.0);
            for _ in 0..rounds {
                for _ in 0..prices_per_round {
                    prices.push(rng.random::<f64>() * (high - low) + low);
                }
                if drift {
                    low += std_normal.sample(rng);
                    high += std_normal.sample(rng);
                    if high < low {
                        std::mem::swap(&mut low, &mut high);
                    }
                }
            }
        }
        PriceModel::Gaussian => {
            let (mut mean, mut sigma) = (0.0, 1.0);
            for _ in 0..rounds {
                let dist = Normal::new(mean, sigma).map_err(|e| invalid("sigma", e))?;
                prices.extend(dist.sample_iter(&mut *rng).take(prices_per_round));
                if drift {
                    mean += std_normal.sample(rng);
                    sigma = (sigma + std_normal.sample(rng)).abs();
                }
            }
        }
        PriceModel::Exponential => {
            let mut mean: f64 = 1.0;
            for _ in 0..rounds {
                let dist = Exp::new(1.0 / mean).map_err(|e| invalid("mean", e))?;
                prices.extend(dist.sample_iter(&mut *rng).take(prices_per_round));
                if drift {
                    mean = (mean + std_normal.sample(rng)).max(MIN_EXP_MEAN);
                }
            }
        }
        PriceModel::Bernoulli => {
            let mut prob = 0.5;
            for _ in 0..rounds {
                let dist = Bernoulli::new(prob).map_err(|e| invalid("probability", e))?;
                prices.extend(
                    dist.sample_iter(&mut *rng)
                        .take(prices_per_round)
                        .map(|hit| if hit { 1.0 } else { 0.0 }),
                );
                if drift {
                    prob = rng.random::<f64>();
                }
            }
        }
        PriceModel::Autoregressive { phi } => {
            let mut prev: f64 = std_normal.sample(rng);
            for _ in 0..total {
                prev = phi * prev + std_normal.sample(rng);
                prices.push(prev);
            }
        }
        PriceModel::MovingAverage { theta } => {
            let mut prev_noise = 0.0;
            for _ in 0..total {
                let noise = std_normal.sample(rng);
                prices.push(noise + theta * prev_noise);
                prev_noise = noise;
            }
        }
        PriceModel::Sine { frequency } | PriceModel::SteepSine { frequency } => {
            let steep = matches!(model, PriceModel::SteepSine { .. });
            let angular = 2.0 * PI * frequency / total as f64;
            for i in 0..total {
                let wave = (i as f64 * angular).sin();
                let shape = if steep { wave.cbrt() } else { wave };
                prices.push(5.0 * shape + std_normal.sample(rng));
            }
        }
    }

    PriceSeries::new(rounds, prices_per_round, prices)
}

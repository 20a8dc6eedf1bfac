//! Hindsight baselines used as the regret yardstick.

use crate::{
    data::PriceSeries,
    environment::RewardTable,
    error::{BanditError, Result},
    state::{GainCurve, Ledger, ThresholdStats, argmax},
};

/// Result of an oracle computation: its gain curve and, for the best-hand
/// oracle, how often each threshold was the round's best.
#[derive(Debug, Clone)]
pub struct OracleRun {
    pub name: &'static str,
    pub gains: GainCurve,
    pub arms: Vec<ThresholdStats>,
}

/// Picks, in every round, the threshold with the largest reward in that
/// round's row (lowest index on ties). No causal policy can beat it.
pub fn find_best_hand(table: &RewardTable) -> OracleRun {
    let mut ledger = Ledger::new(table);
    while !ledger.exhausted() {
        let best = argmax(table.row(ledger.round()).iter().copied());
        ledger.play(best);
    }
    let (gains, arms) = ledger.into_parts();
    OracleRun {
        name: "Best Hand",
        gains,
        arms,
    }
}

/// Trades every local extremum of each round with a single unit: sell at
/// each point not below its left neighbour, buy at each point not above
/// its right neighbour. The first price can only be a buy and the last
/// only a sell.
pub fn find_local_extrema_optimum(prices: &PriceSeries, max_items: u32) -> Result<OracleRun> {
    if max_items != 1 {
        return Err(BanditError::UnsupportedCapacity(max_items));
    }
    if prices.prices_per_round() < 2 {
        return Err(BanditError::InvalidDimensions(
            "local extrema need at least two prices per round".to_string(),
        ));
    }

    let mut gains = GainCurve::with_capacity(prices.rounds());
    for round in prices.iter_rounds() {
        gains.push(round_extrema_gain(round));
    }
    Ok(OracleRun {
        name: "Local Extrema",
        gains,
        arms: Vec::new(),
    })
}

fn round_extrema_gain(p: &[f64]) -> f64 {
    let last = p.len() - 1;
    let mut gain = 0.0;
    for n in 0..=last {
        let sell = n > 0 && p[n] >= p[n - 1];
        let buy = n < last && p[n] <= p[n + 1];
        if sell {
            gain += p[n];
        }
        if buy {
            gain -= p[n];
        }
    }
    gain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_hand_takes_row_maxima() {
        let table =
            RewardTable::from_rows(&[vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0], vec![2.0, 0.0]])
                .unwrap();
        let oracle = find_best_hand(&table);
        assert_eq!(oracle.gains.per_round, vec![1.0, 2.0, 1.0, 2.0]);
        assert_eq!(oracle.gains.cumulative, vec![1.0, 3.0, 4.0, 6.0]);
        // the tie in round 2 goes to threshold 0
        assert_eq!(oracle.arms[0].times_chosen, 3);
        assert_eq!(oracle.arms[1].times_chosen, 1);
    }

    #[test]
    fn extrema_gain_is_sum_of_rises() {
        let round: [f64; 6] = [0.5, 0.2, 0.6, 0.9, 0.4, 0.7];
        let rises: f64 = round
            .windows(2)
            .map(|w| (w[1] - w[0]).max(0.0))
            .sum();
        assert!((round_extrema_gain(&round) - rises).abs() < 1e-12);
    }

    #[test]
    fn extrema_boundaries_use_single_neighbour() {
        // falling round: nothing to trade
        assert_eq!(round_extrema_gain(&[0.9, 0.5, 0.1]), 0.0);
        // rising two-point round: buy first, sell last
        assert!((round_extrema_gain(&[0.2, 0.7]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn extrema_rejects_multi_unit_capacity() {
        let prices = PriceSeries::from_rounds(&[vec![0.1, 0.9]]).unwrap();
        assert!(matches!(
            find_local_extrema_optimum(&prices, 2),
            Err(BanditError::UnsupportedCapacity(2))
        ));
        let run = find_local_extrema_optimum(&prices, 1).unwrap();
        assert_eq!(run.gains.len(), 1);
    }
}

//! The six threshold-selection strategies. All of them read the same
//! reward table and keep their bookkeeping in a [`Ledger`](crate::state::Ledger).

pub mod epsilon_greedy;
pub mod exp3;
pub mod greedy;
pub mod successive_elimination;
pub mod ucb1;
pub mod ucb2;

use crate::state::Ledger;

/// Plays every threshold once in index order, stopping early if the
/// round budget runs out.
pub(crate) fn seed_each_arm(ledger: &mut Ledger<'_>) {
    for arm in 0..ledger.arms.len() {
        if ledger.exhausted() {
            break;
        }
        ledger.play(arm);
    }
}

/// Hoeffding radius sqrt(2 ln(t+1) / n). Infinite for an unplayed arm.
pub(crate) fn confidence_radius(round: usize, times_chosen: u64) -> f64 {
    if times_chosen == 0 {
        return f64::INFINITY;
    }
    (2.0 * ((round + 1) as f64).ln() / times_chosen as f64).sqrt()
}

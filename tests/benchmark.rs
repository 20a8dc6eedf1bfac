use prophetic_bandits::{
    Bandit, PolicyKind, PriceSeries, RewardTable,
    config::BanditConfig,
    oracle::find_best_hand,
    report::{average_regret, best_hand_percentage, render_policy},
    simulation::{evaluate, run_policies},
};

fn scenario_table() -> RewardTable {
    RewardTable::from_rows(&[vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0], vec![2.0, 0.0]]).unwrap()
}

fn wavy_prices(rounds: usize, per_round: usize) -> PriceSeries {
    let rows: Vec<Vec<f64>> = (0..rounds)
        .map(|t| {
            (0..per_round)
                .map(|n| {
                    let x = (t * per_round + n) as f64;
                    10.0 + 3.0 * (x * 0.7).sin() + (x * 0.13).cos()
                })
                .collect()
        })
        .collect();
    PriceSeries::from_rounds(&rows).unwrap()
}

#[test]
fn greedy_scenario_cumulative_gains() {
    let table = scenario_table();
    let runs = run_policies(&table, &[PolicyKind::Greedy], 0.3, 0);
    assert_eq!(runs[0].gains.cumulative, vec![1.0, 3.0, 4.0, 4.0]);
}

#[test]
fn ucb1_scenario_first_three_rounds() {
    let table = scenario_table();
    let runs = run_policies(&table, &[PolicyKind::Ucb1], 0.3, 0);
    assert_eq!(&runs[0].gains.cumulative[..3], &[1.0, 3.0, 4.0]);
}

#[test]
fn best_hand_oracle_dominates_every_policy() {
    let table = scenario_table();
    let oracle = find_best_hand(&table);
    assert_eq!(oracle.gains.per_round, vec![1.0, 2.0, 1.0, 2.0]);
    assert_eq!(oracle.gains.cumulative, vec![1.0, 3.0, 4.0, 6.0]);

    for seed in 0..10 {
        for run in run_policies(&table, &PolicyKind::ALL, 0.3, seed) {
            let regret = average_regret(&oracle.gains, &run.gains).unwrap();
            assert!(regret.iter().all(|&r| r >= 0.0), "{}: {regret:?}", run.policy);
        }
    }
}

#[test]
fn every_policy_keeps_exact_prefix_sums() {
    let mut prices = wavy_prices(400, 8);
    let config = BanditConfig {
        thresholds: 6,
        seed: Some(42),
        ..BanditConfig::default()
    };
    let evaluation = evaluate(&mut prices, &config).unwrap();
    assert_eq!(evaluation.runs.len(), 6);

    for run in &evaluation.runs {
        let gains = &run.gains;
        assert_eq!(gains.len(), 400, "{}", run.policy);
        assert_eq!(gains.cumulative[0], gains.per_round[0]);
        for t in 1..gains.len() {
            assert_eq!(gains.cumulative[t], gains.cumulative[t - 1] + gains.per_round[t]);
        }
        let plays: u64 = run.arms.iter().map(|a| a.times_chosen).sum();
        assert_eq!(plays, 400);

        let pct = best_hand_percentage(&evaluation.best_hand.gains, gains).unwrap();
        assert!(pct.iter().all(|p| (0.0..=100.0).contains(p)));
        assert!(render_policy(run, &evaluation.best_hand.gains).is_ok());
    }
}

#[test]
fn single_threshold_leaves_no_choice() {
    let table = RewardTable::from_rows(&[vec![0.3], vec![-0.1], vec![0.7], vec![0.2]]).unwrap();
    let column: Vec<f64> = table.column(0).collect();
    for run in run_policies(&table, &[PolicyKind::Greedy, PolicyKind::Ucb1], 0.3, 0) {
        assert_eq!(run.gains.per_round, column);
        assert_eq!(run.arms[0].times_chosen, 4);
    }
}

#[test]
fn fixed_seed_reproduces_evaluation() {
    let config = BanditConfig {
        thresholds: 5,
        seed: Some(7),
        local_extrema: true,
        ..BanditConfig::default()
    };
    let a = evaluate(&mut wavy_prices(200, 6), &config).unwrap();
    let b = evaluate(&mut wavy_prices(200, 6), &config).unwrap();
    for (x, y) in a.runs.iter().zip(&b.runs) {
        assert_eq!(x.gains, y.gains);
        assert_eq!(x.diagnostics, y.diagnostics);
    }
    assert!(a.local_extrema.is_some());
}

#[test]
fn policies_share_one_table_without_interference() {
    let table = scenario_table();
    let bandit = Bandit::new(&table);
    assert_eq!(bandit.bounds.min, 0.0);
    assert_eq!(bandit.bounds.max, 2.0);

    let together = run_policies(&table, &[PolicyKind::Greedy, PolicyKind::Ucb1], 0.3, 1);
    let alone = run_policies(&table, &[PolicyKind::Ucb1], 0.3, 1);
    assert_eq!(together[1].gains, alone[0].gains);
}

//! Regret bookkeeping and output sinks. Nothing here feeds back into the
//! policies.

use std::{
    fmt::Write as _,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use polars::{
    frame::DataFrame,
    io::SerWriter,
    prelude::{Column, CsvWriter},
};
use tracing::{info, warn};

use crate::{
    agent::{Diagnostics, PolicyRun},
    error::{BanditError, Result},
    oracle::OracleRun,
    policies::ucb2::average_epoch_duration,
    state::{GainCurve, ThresholdStats},
};

const RULE: &str =
    "--------------------------------------------------------------------------------";

fn check_lengths(oracle: &GainCurve, policy: &GainCurve) -> Result<()> {
    if oracle.len() != policy.len() {
        return Err(BanditError::LengthMismatch {
            oracle: oracle.len(),
            policy: policy.len(),
        });
    }
    Ok(())
}

/// (oracle[t] − policy[t]) / (t + 1) over the cumulative curves.
pub fn average_regret(oracle: &GainCurve, policy: &GainCurve) -> Result<Vec<f64>> {
    check_lengths(oracle, policy)?;
    Ok(oracle
        .cumulative
        .iter()
        .zip(&policy.cumulative)
        .enumerate()
        .map(|(t, (opt, gain))| (opt - gain) / (t + 1) as f64)
        .collect())
}

/// Percentage of rounds up to t in which the policy earned exactly what
/// the oracle earned.
pub fn best_hand_percentage(oracle: &GainCurve, policy: &GainCurve) -> Result<Vec<f64>> {
    check_lengths(oracle, policy)?;
    let mut hits = 0u64;
    Ok(oracle
        .per_round
        .iter()
        .zip(&policy.per_round)
        .enumerate()
        .map(|(t, (opt, gain))| {
            if opt == gain {
                hits += 1;
            }
            100.0 * hits as f64 / (t + 1) as f64
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicySummary {
    pub total_gain: f64,
    pub total_opt: f64,
    pub total_regret: f64,
    pub average_gain: f64,
    pub average_opt: f64,
    pub average_regret: f64,
}

impl PolicySummary {
    pub fn new(oracle: &GainCurve, policy: &GainCurve) -> Result<Self> {
        check_lengths(oracle, policy)?;
        let rounds = policy.len().max(1) as f64;
        let total_gain = policy.total();
        let total_opt = oracle.total();
        Ok(Self {
            total_gain,
            total_opt,
            total_regret: total_opt - total_gain,
            average_gain: total_gain / rounds,
            average_opt: total_opt / rounds,
            average_regret: (total_opt - total_gain) / rounds,
        })
    }
}

fn banner(title: &str) -> String {
    format!("{:-^80}", title.to_uppercase().replace(' ', "-"))
}

fn base_columns(out: &mut String, arm: &ThresholdStats) {
    let _ = write!(
        out,
        "{:<7.2}\t\t{:<10.2}\t{:<12}\t{:<8.6}",
        arm.threshold, arm.reward_sum, arm.times_chosen, arm.avg_reward
    );
}

/// Per-threshold table for an oracle run.
pub fn render_oracle(oracle: &OracleRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", banner(oracle.name));
    if !oracle.arms.is_empty() {
        let _ = writeln!(out, "Threshold\tTotal Reward\tTimes Chosen\tAverage Reward");
        for arm in &oracle.arms {
            base_columns(&mut out, arm);
            out.push('\n');
        }
        let _ = writeln!(out, "{RULE}");
    }
    let rounds = oracle.gains.len().max(1) as f64;
    let _ = writeln!(out, "OPT: {:.6}", oracle.gains.total());
    let _ = writeln!(out, "Average OPT: {:.6}", oracle.gains.total() / rounds);
    let _ = writeln!(out, "{RULE}");
    out
}

/// Per-threshold table, policy-specific columns, and the regret summary.
pub fn render_policy(run: &PolicyRun, oracle: &GainCurve) -> Result<String> {
    let summary = PolicySummary::new(oracle, &run.gains)?;
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", banner(run.policy));

    let extra_header = match &run.diagnostics {
        Diagnostics::None | Diagnostics::EpsilonGreedy { .. } => "",
        Diagnostics::SuccessiveElimination { .. } => "\tFinal UCB\tFinal LCB\tActive",
        Diagnostics::Ucb1 { .. } => "\tUCB",
        Diagnostics::Ucb2 { .. } => "\tUCB\t\tEpochs Chosen\tAverage Epoch Duration",
        Diagnostics::Exp3 { .. } => "\tLog Weight\tProbability",
    };
    let _ = writeln!(
        out,
        "Threshold\tTotal Reward\tTimes Chosen\tAverage Reward{extra_header}"
    );

    for (k, arm) in run.arms.iter().enumerate() {
        base_columns(&mut out, arm);
        match &run.diagnostics {
            Diagnostics::SuccessiveElimination { upper, lower, active, .. } => {
                let _ = write!(
                    out,
                    "\t{:<10.5}\t{:<10.5}\t{}",
                    upper[k], lower[k], u8::from(active[k])
                );
            }
            Diagnostics::Ucb1 { upper } => {
                let _ = write!(out, "\t{:<.5}", upper[k]);
            }
            Diagnostics::Ucb2 { upper, epochs } => {
                let _ = write!(
                    out,
                    "\t{:<10.5}\t{:<13}\t{:<.5}",
                    upper[k],
                    epochs[k],
                    average_epoch_duration(arm.times_chosen, epochs[k])
                );
            }
            Diagnostics::Exp3 { log_weights, probabilities, .. } => {
                let _ = write!(
                    out,
                    "\t{:<10.4}\t{:<.6}%",
                    log_weights[k],
                    100.0 * probabilities[k]
                );
            }
            Diagnostics::None | Diagnostics::EpsilonGreedy { .. } => {}
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{RULE}");

    match &run.diagnostics {
        Diagnostics::EpsilonGreedy { explored, exploited, final_explore_prob } => {
            let _ = writeln!(out, "Final Exploration Chance: {:.6}%", 100.0 * final_explore_prob);
            let _ = writeln!(out, "Explored: {explored}");
            let _ = writeln!(out, "Exploited: {exploited}");
        }
        Diagnostics::Exp3 { final_gamma, .. } => {
            let _ = writeln!(out, "Final Gamma (Exploration Chance): {:.6}%", 100.0 * final_gamma);
        }
        _ => {}
    }

    let _ = writeln!(out, "Total Gain: {:.6}", summary.total_gain);
    let _ = writeln!(out, "Total OPT: {:.6}", summary.total_opt);
    let _ = writeln!(out, "Total Regret: {:.6}", summary.total_regret);
    let _ = writeln!(out, "Average Gain: {:.6}", summary.average_gain);
    let _ = writeln!(out, "Average OPT: {:.6}", summary.average_opt);
    let _ = writeln!(out, "Average Regret: {:.6}", summary.average_regret);
    let _ = writeln!(out, "{RULE}");
    Ok(out)
}

/// A named per-round series, e.g. one policy's average regret.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Writes `round,<name>...` columns to `dir/file_name`.
pub fn write_csv(dir: &Path, file_name: &str, series: &[Series]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let rounds = series.first().map_or(0, |s| s.values.len());

    let mut columns = vec![Column::new("round".into(), (0..rounds as u64).collect::<Vec<_>>())];
    for s in series {
        columns.push(Column::new(s.name.as_str().into(), s.values.clone()));
    }
    let mut df = DataFrame::new(columns)?;

    let path = dir.join(file_name);
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    info!(path = %path.display(), "series written");
    Ok(path)
}

/// Streams series into an external gnuplot process.
#[derive(Debug, Clone)]
pub struct GnuplotSink {
    command: String,
    max_points: usize,
}

const COLOURS: [&str; 6] = ["orange", "red", "cyan", "blue", "purple", "green"];

impl GnuplotSink {
    pub fn new(command: impl Into<String>, max_points: usize) -> Self {
        Self {
            command: command.into(),
            max_points: max_points.max(1),
        }
    }

    /// Plot step so that at most about `max_points` points are sent.
    pub fn step(&self, rounds: usize) -> usize {
        (rounds / self.max_points).max(1)
    }

    /// Gnuplot script for `series`, inline data blocks included.
    pub fn script(&self, title: &str, y_label: &str, series: &[Series]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "set title '{title}'");
        let _ = writeln!(out, "set xlabel 'Rounds'");
        let _ = writeln!(out, "set ylabel '{y_label}'");
        let _ = writeln!(out, "set grid");
        let _ = writeln!(out, "set key left top");

        let plots: Vec<String> = series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "'-' using 1:2 with lines lt rgb '{}' lw 2 title '{}'",
                    COLOURS[i % COLOURS.len()],
                    s.name
                )
            })
            .collect();
        let _ = writeln!(out, "plot {}", plots.join(", "));

        for s in series {
            let step = self.step(s.values.len());
            for (t, v) in s.values.iter().enumerate().step_by(step) {
                let _ = writeln!(out, "{t} {v:.6}");
            }
            let _ = writeln!(out, "e");
        }
        out
    }

    pub fn plot(&self, title: &str, y_label: &str, series: &[Series]) -> Result<()> {
        if series.is_empty() {
            return Ok(());
        }
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| BanditError::Plot("empty plot command".to_string()))?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| BanditError::Plot(format!("could not start {program}: {e}")))?;

        let script = self.script(title, y_label, series);
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(script.as_bytes())
                .and_then(|()| stdin.flush()),
            None => Ok(()),
        };

        // reap the child even when gnuplot closed the pipe early
        let status = child.wait()?;
        written.map_err(|e| BanditError::Plot(format!("could not write to {program}: {e}")))?;
        if !status.success() {
            warn!(%status, "plot process exited with failure");
            return Err(BanditError::Plot(format!("{program} exited with {status}")));
        }
        Ok(())
    }
}

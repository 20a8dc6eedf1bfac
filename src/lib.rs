//! Online threshold-trading bandits.
//!
//! A price file is normalized, turned into a T×K reward table (one column
//! per threshold k/K), and replayed by a family of bandit policies. Each
//! policy's cumulative gain is compared against a hindsight oracle to
//! produce regret and best-hand series.

pub mod agent;
pub mod cli;
pub mod config;
pub mod data;
pub mod environment;
pub mod error;
pub mod generator;
pub mod oracle;
pub mod policies;
pub mod report;
pub mod simulation;
pub mod state;

pub use agent::{Bandit, BanditPolicy, Diagnostics, PolicyKind, PolicyRun};
pub use data::PriceSeries;
pub use environment::{RewardBounds, RewardTable, compute_reward_table};
pub use error::{BanditError, Result};

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{
    agent::PolicyKind,
    error::{BanditError, Result},
    policies::ucb2::DEFAULT_ALPHA,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub bandit: BanditConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BanditConfig {
    /// Number of thresholds K, evenly spaced over [0, 1)
    pub thresholds: usize,
    /// Maximum units held at once (M)
    pub max_items: u32,
    /// UCB2 epoch growth
    pub ucb2_alpha: f64,
    /// Base seed; absent means seed from the clock
    pub seed: Option<u64>,
    pub policies: Vec<PolicyKind>,
    /// Also compute the local-extrema oracle (single-unit capacity only)
    pub local_extrema: bool,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            thresholds: 10,
            max_items: 1,
            ucb2_alpha: DEFAULT_ALPHA,
            seed: None,
            policies: PolicyKind::ALL.to_vec(),
            local_extrema: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory for regret / best-hand CSV files
    pub output_dir: Option<PathBuf>,
    pub plot: bool,
    pub plot_command: String,
    /// Plots are down-sampled to about this many points per series
    pub max_plot_points: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            plot: false,
            plot_command: "gnuplot -persistent".to_string(),
            max_plot_points: 10_000,
        }
    }
}

impl SimulationConfig {
    /// Layers an optional TOML file and `PROPHET_*` environment variables
    /// (e.g. `PROPHET_BANDIT__THRESHOLDS=20`) over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("PROPHET")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("bandit.policies")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bandit.thresholds == 0 {
            return Err(BanditError::InvalidParameter {
                name: "thresholds",
                reason: "at least one threshold is required".to_string(),
            });
        }
        if self.bandit.max_items == 0 {
            return Err(BanditError::InvalidParameter {
                name: "max_items",
                reason: "capacity must allow holding one item".to_string(),
            });
        }
        if !(self.bandit.ucb2_alpha.is_finite() && self.bandit.ucb2_alpha > 0.0) {
            return Err(BanditError::InvalidParameter {
                name: "ucb2_alpha",
                reason: format!("must be a positive number, got {}", self.bandit.ucb2_alpha),
            });
        }
        if self.bandit.local_extrema && self.bandit.max_items != 1 {
            return Err(BanditError::UnsupportedCapacity(self.bandit.max_items));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_env(key: &str, value: Option<&str>) {
        // SAFETY: every test that touches PROPHET_* holds ENV_LOCK.
        unsafe {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.bandit.thresholds, 10);
        assert_eq!(config.bandit.max_items, 1);
        assert_eq!(config.bandit.policies.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[bandit]\nthresholds = 25\npolicies = [\"ucb1\", \"exp3\"]\n\n[report]\nplot = true"
        )
        .unwrap();

        let config = SimulationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bandit.thresholds, 25);
        assert_eq!(config.bandit.max_items, 1);
        assert_eq!(config.bandit.policies, vec![PolicyKind::Ucb1, PolicyKind::Exp3]);
        assert!(config.report.plot);
        assert_eq!(config.report.max_plot_points, 10_000);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_env("PROPHET_BANDIT__THRESHOLDS", Some("20"));
        set_env("PROPHET_BANDIT__POLICIES", Some("greedy,ucb2"));
        let loaded = SimulationConfig::load(None);
        set_env("PROPHET_BANDIT__THRESHOLDS", None);
        set_env("PROPHET_BANDIT__POLICIES", None);

        let config = loaded.unwrap();
        assert_eq!(config.bandit.thresholds, 20);
        assert_eq!(config.bandit.policies, vec![PolicyKind::Greedy, PolicyKind::Ucb2]);
        assert_eq!(config.bandit.max_items, 1);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let mut config = SimulationConfig::default();
        config.bandit.thresholds = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.bandit.ucb2_alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.bandit.max_items = 3;
        config.bandit.local_extrema = true;
        assert!(matches!(
            config.validate(),
            Err(BanditError::UnsupportedCapacity(3))
        ));
    }
}

//! Solve settings and run configuration.
//!
//! [`RunConfig::load`] reads an optional TOML file and then
//! `GPSIZE__`-prefixed environment variables (`GPSIZE__SOLVE__TOL=1e-5`,
//! `GPSIZE__WING=blown`), later sources winning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::aircraft::{Objective, WingMode};
use crate::error::{Result, SizingError};
use crate::model::{ModelNode, Substitutions};
use crate::solver::ClarabelSettings;
use crate::sweep::SweepSpec;
use crate::units::{Quantity, UnitTable};

/// Settings of the successive-convexification loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveSettings {
    /// Maximum number of convex solves.
    pub max_iters: usize,
    /// Relative cost change below which the loop has converged.
    pub tol: f64,
    /// Relative cost increase tolerated before declaring divergence.
    pub cost_rise_tol: f64,
    /// Bounded wait on each convex solve, in seconds.
    pub dispatch_timeout_secs: Option<f64>,
    pub backend: ClarabelSettings,
}

impl Default for SolveSettings {
    fn default() -> Self {
        SolveSettings {
            max_iters: 50,
            tol: 1e-4,
            cost_rise_tol: 1e-6,
            dispatch_timeout_secs: None,
            backend: ClarabelSettings::default(),
        }
    }
}

impl SolveSettings {
    /// The bounded wait on each convex solve. Values that are not positive
    /// or too large for a [`Duration`] mean no bound.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_secs
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    /// Backend settings with the time limit capped by the dispatch timeout,
    /// so an abandoned solve stops on its own.
    pub fn backend_settings(&self) -> ClarabelSettings {
        let mut backend = self.backend.clone();
        if let Some(timeout) = self.dispatch_timeout() {
            backend.time_limit = backend.time_limit.min(timeout.as_secs_f64());
        }
        backend
    }
}

/// One swept variable: a path and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub path: String,
    pub values: Vec<f64>,
}

impl SweepAxis {
    /// `count` evenly spaced values from `start` to `stop` inclusive.
    pub fn linspace(path: impl Into<String>, start: f64, stop: f64, count: usize) -> Self {
        let values = match count {
            0 => Vec::new(),
            1 => vec![start],
            n => (0..n)
                .map(|i| start + (stop - start) * i as f64 / (n - 1) as f64)
                .collect(),
        };
        SweepAxis {
            path: path.into(),
            values,
        }
    }
}

/// Where and how much to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory for report files; nothing is written when unset.
    pub dir: Option<PathBuf>,
    /// Number of sensitivities to print.
    pub top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig { dir: None, top: 10 }
    }
}

/// Configuration of one run of the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub solve: SolveSettings,
    pub wing: WingMode,
    pub objective: Objective,
    /// Variable path to `"<value>"` or `"<value> <unit>"`.
    pub substitutions: BTreeMap<String, String>,
    pub sweep: Vec<SweepAxis>,
    pub skip_failures: bool,
    pub report: ReportConfig,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            solve: SolveSettings::default(),
            wing: WingMode::default(),
            objective: Objective::default(),
            substitutions: BTreeMap::new(),
            sweep: Vec::new(),
            skip_failures: false,
            report: ReportConfig::default(),
            log_level: "info".into(),
        }
    }
}

impl RunConfig {
    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(RunConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let figment = figment.merge(Env::prefixed("GPSIZE__").split("__"));
        Ok(figment.extract()?)
    }

    /// Resolve the textual substitutions against `root`.
    ///
    /// A bare number is taken in the variable's own unit; a number with a
    /// unit is converted.
    pub fn substitutions_for(&self, root: &ModelNode) -> Result<Substitutions> {
        let mut subs = Substitutions::new();
        for (path, text) in &self.substitutions {
            let key = root.find_variable(path).ok_or_else(|| {
                SizingError::invalid_substitution(path, "no variable at this path")
            })?;
            let quantity = Quantity::parse(text, UnitTable::standard())?;
            if quantity.unit.is_dimensionless() && quantity.unit.symbol() == "-" {
                subs.insert(&key, quantity.value);
            } else {
                subs.insert(&key, quantity);
            }
        }
        Ok(subs)
    }

    /// The sweep axes resolved against `root`, if any were configured.
    pub fn sweep_for(&self, root: &ModelNode) -> Result<Option<SweepSpec>> {
        if self.sweep.is_empty() {
            return Ok(None);
        }
        let mut spec = SweepSpec::new();
        for axis in &self.sweep {
            let key = root.find_variable(&axis.path).ok_or_else(|| {
                SizingError::invalid_substitution(&axis.path, "no variable at this path")
            })?;
            spec = spec.axis(&key, axis.values.clone())?;
        }
        Ok(Some(spec))
    }
}

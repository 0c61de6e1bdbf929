//! Run configuration for the fitting workflows.

use crate::data::LagRange;
use crate::error::Result;
use crate::lm::{LevenbergMarquardt, LmConfig, SolverMethod};
use crate::models::{FragmentKernel, InitialGuess, ModelConstants};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Everything a fitting run depends on besides the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub fit_start: f64,
    pub fit_end: f64,
    pub kernel: FragmentKernel,
    pub method: SolverMethod,
    /// Budget of residual evaluations per fit
    pub max_evaluations: usize,
    /// Upper bound of the mean fragment size, and its value when fixed
    pub genome_length: f64,
    /// Fit the selected variant with a fragment size fixed at the genome
    /// length (template switching) instead of fitting it (fragment incorporation)
    pub fixed_fragment: bool,
    pub constants: ModelConstants,
    pub initial: InitialGuess,
    /// Fit groups on the rayon thread pool
    pub parallel: bool,
    /// Tolerances and damping schedule; its evaluation budget is replaced
    /// by `max_evaluations`
    pub solver: LmConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        let range = LagRange::default();
        Self {
            fit_start: range.fit_start,
            fit_end: range.fit_end,
            kernel: FragmentKernel::default(),
            method: SolverMethod::default(),
            max_evaluations: 1_000_000,
            genome_length: 30_000.0,
            fixed_fragment: true,
            constants: ModelConstants::default(),
            initial: InitialGuess::default(),
            parallel: false,
            solver: LmConfig::default(),
        }
    }
}

impl FitConfig {
    /// The fit window, validated.
    pub fn lag_range(&self) -> Result<LagRange> {
        LagRange::new(self.fit_start, self.fit_end)
    }

    /// A solver with this configuration's tolerances and evaluation budget.
    pub fn optimizer(&self) -> LevenbergMarquardt {
        LevenbergMarquardt::with_config(self.solver.clone()).with_max_evaluations(self.max_evaluations)
    }

    /// Save the configuration to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take their defaults.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: FitConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FitConfig::default();
        assert_eq!(config.fit_start, 3.0);
        assert_eq!(config.fit_end, 300.0);
        assert_eq!(config.method, SolverMethod::LeastSquares);
        assert_eq!(config.kernel, FragmentKernel::Constant);
        assert_eq!(config.max_evaluations, 1_000_000);
        assert!(config.fixed_fragment);
        assert_eq!(config.optimizer().config().max_evaluations, 1_000_000);
    }

    #[test]
    fn test_json_round_trip() {
        let path = std::env::temp_dir().join(format!("mcorr_fit_config_{}.json", std::process::id()));

        let config = FitConfig {
            kernel: FragmentKernel::Geometric,
            method: SolverMethod::LeastSq,
            fixed_fragment: false,
            ..FitConfig::default()
        };
        config.save_json(&path).unwrap();
        let loaded = FitConfig::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json() {
        let config: FitConfig = serde_json::from_str(r#"{"method": "leastsq", "fit_end": 150}"#).unwrap();
        assert_eq!(config.method, SolverMethod::LeastSq);
        assert_eq!(config.fit_end, 150.0);
        assert_eq!(config.genome_length, 30_000.0);

        assert!(serde_json::from_str::<FitConfig>(r#"{"method": "nelder"}"#).is_err());
    }

    #[test]
    fn test_solver_settings_reach_optimizer() {
        let config: FitConfig =
            serde_json::from_str(r#"{"max_evaluations": 500, "solver": {"ftol": 1e-8, "max_evaluations": 7}}"#)
                .unwrap();
        assert_eq!(config.solver.ftol, 1e-8);
        assert_eq!(config.solver.gtol, LmConfig::default().gtol);

        let optimizer = config.optimizer();
        assert_eq!(optimizer.config().ftol, 1e-8);
        assert_eq!(optimizer.config().xtol, 1e-10);
        assert_eq!(optimizer.config().max_evaluations, 500);
    }
}

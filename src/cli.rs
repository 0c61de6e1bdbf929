//! Command-line arguments shared by the fitting binaries.

use crate::error::Result;
use crate::fit::FitConfig;
use crate::lm::SolverMethod;
use crate::models::FragmentKernel;
use clap::Args;
use std::path::PathBuf;

/// Arguments of a fitting run.
#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    /// Correlation input file (lag,value,variance,sampleSize,kind,group)
    pub corr_file: PathBuf,

    /// Prefix of every output file
    pub output_prefix: String,

    /// Smallest lag included in the fit
    #[arg(long, default_value_t = 3)]
    pub fit_start: u32,

    /// Largest lag included in the fit
    #[arg(long, default_value_t = 300)]
    pub fit_end: u32,

    /// Use a geometric distribution of fragment sizes (same as --kernel geom)
    #[arg(long)]
    pub use_geom_frag: bool,

    /// Fragment-size kernel: const, exp or geom
    #[arg(long, default_value = "const")]
    pub kernel: String,

    /// Solver method: least_squares or leastsq
    #[arg(long, default_value = "least_squares")]
    pub fit_method: String,

    /// Maximum number of function evaluations per fit
    #[arg(long, default_value_t = 1_000_000)]
    pub max_nfev: usize,

    /// Length of the viral genome
    #[arg(long, default_value_t = 30_000)]
    pub genome_length: u64,

    /// Fit replicates with the template-switching model (fragment size fixed
    /// at the genome length) instead of fragment incorporation
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub template_switching: bool,

    /// Fit groups in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Only log warnings and hide the progress bar
    #[arg(long, short)]
    pub quiet: bool,
}

impl FitArgs {
    /// The run configuration these arguments describe.
    pub fn to_config(&self) -> Result<FitConfig> {
        let kernel = if self.use_geom_frag {
            FragmentKernel::Geometric
        } else {
            self.kernel.parse()?
        };
        let method: SolverMethod = self.fit_method.parse()?;

        let config = FitConfig {
            fit_start: self.fit_start as f64,
            fit_end: self.fit_end as f64,
            kernel,
            method,
            max_evaluations: self.max_nfev,
            genome_length: self.genome_length as f64,
            fixed_fragment: self.template_switching,
            parallel: self.parallel,
            ..FitConfig::default()
        };
        config.lag_range()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McorrError;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: FitArgs,
    }

    fn parse(argv: &[&str]) -> FitArgs {
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["fit", "corr.csv", "out"]);
        let config = args.to_config().unwrap();

        assert_eq!(config, FitConfig::default());
        assert_eq!(args.output_prefix, "out");
        assert!(!args.quiet);
    }

    #[test]
    fn test_options() {
        let args = parse(&[
            "fit",
            "corr.csv",
            "out",
            "--fit-end",
            "150",
            "--use-geom-frag",
            "--fit-method",
            "leastsq",
            "--template-switching",
            "false",
            "--genome-length",
            "10000",
            "--quiet",
        ]);
        let config = args.to_config().unwrap();

        assert_eq!(config.fit_end, 150.0);
        assert_eq!(config.kernel, FragmentKernel::Geometric);
        assert_eq!(config.method, SolverMethod::LeastSq);
        assert!(!config.fixed_fragment);
        assert_eq!(config.genome_length, 10_000.0);
        assert!(args.quiet);
    }

    #[test]
    fn test_invalid_values() {
        let args = parse(&["fit", "corr.csv", "out", "--fit-method", "nelder"]);
        assert!(matches!(args.to_config(), Err(McorrError::UnknownMethod(_))));

        let args = parse(&["fit", "corr.csv", "out", "--kernel", "gaussian"]);
        assert!(matches!(args.to_config(), Err(McorrError::UnknownKernel(_))));

        let args = parse(&["fit", "corr.csv", "out", "--fit-start", "50", "--fit-end", "10"]);
        assert!(args.to_config().is_err());
    }
}

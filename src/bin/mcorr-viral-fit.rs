//! Fit bootstrapped correlation profiles of a viral population with the
//! coalescent model, with and without recombination.

use clap::Parser;
use log::{error, info};
use mcorr_fit::cli::FitArgs;
use mcorr_fit::data::CorrelationDataset;
use mcorr_fit::pipeline::{run_comparison, OutputPrefix};
use std::process::ExitCode;

/// Compare the recombination models against the zero-recombination model on
/// the `all` group, then fit every bootstrap replicate.
#[derive(Parser, Debug)]
#[command(name = "mcorr-viral-fit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: FitArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli.args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &FitArgs) -> mcorr_fit::Result<()> {
    let config = args.to_config()?;
    let dataset = CorrelationDataset::from_path(&args.corr_file)?;
    info!(
        "read {} observations in {} groups from {}",
        dataset.len(),
        dataset.groups().len(),
        args.corr_file.display()
    );

    let output = OutputPrefix::new(&args.output_prefix);
    run_comparison(&dataset, &config, &output, !args.quiet)?;
    Ok(())
}

mod run_fit;
mod run_simulate;

use run_fit::*;
use run_simulate::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "VESPA",
    long_about = "Variational Estimation of Sparse PCA Across subjects\n\
		  Fits one sparse mixing matrix shared by several subjects'\n\
		  data tensors and reports the variational posterior."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit the sparse PCA model to per-subject data matrices
    Fit(FitArgs),

    /// Simulate sparse-factor data shared across subjects
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Fit(args) => {
            run_spca_fit(args.clone())?;
        }
        Commands::Simulate(args) => {
            run_simulate_data(args.clone())?;
        }
    }

    Ok(())
}

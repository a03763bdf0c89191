use vespa::simulate::{generate_sparse_factor_files, SimArgs};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// number of voxels (rows)
    #[arg(short = 'v', long, default_value_t = 100)]
    voxels: usize,

    /// number of time points (columns)
    #[arg(short = 't', long, default_value_t = 50)]
    times: usize,

    /// number of subjects
    #[arg(short = 'b', long, default_value_t = 3)]
    subjects: usize,

    /// number of factors
    #[arg(short = 'k', long, default_value_t = 5)]
    factors: usize,

    /// probability of keeping each mixing-matrix entry
    #[arg(long, default_value_t = 0.3)]
    density: f64,

    /// noise standard deviation
    #[arg(long, default_value_t = 0.1)]
    noise_sd: f64,

    /// standard deviation of the per-subject mean offsets (0 disables them)
    #[arg(long, default_value_t = 0.0)]
    mean_sd: f64,

    /// random seed
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// output file prefix
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long)]
    verbose: bool,
}

/// Generate simulated sparse PCA data files
pub fn run_simulate_data(args: SimulateArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    generate_sparse_factor_files(
        &SimArgs {
            voxels: args.voxels,
            times: args.times,
            subjects: args.subjects,
            factors: args.factors,
            density: args.density,
            noise_sd: args.noise_sd,
            mean_sd: args.mean_sd,
            rseed: args.rseed,
        },
        &args.out,
    )?;

    Ok(())
}

use vespa::common::*;
use vespa::finalize::SpcaFit;
use vespa::fit::fit_spca;
use vespa::options::SpcaOptions;

use tensor_util::common_io::{mkdir, open_buf_writer, write_types};
use tensor_util::stack::stack_diagonals;
use tensor_util::traits::IoOps;

use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug, Clone)]
pub struct FitArgs {
    /// per-subject data files (voxel x time tsv, gzipped or not). All
    /// files must share the same dimensions.
    #[arg(required = true)]
    data_files: Vec<Box<str>>,

    /// number of components
    #[arg(long, short = 'k', default_value_t = 10)]
    num_components: usize,

    /// stopping tolerance on the relative ELBO change
    #[arg(long, default_value_t = 1e-9)]
    conv_crit: f64,

    /// maximum number of sweeps
    #[arg(long, default_value_t = 200)]
    maxiter: usize,

    /// keep the noise precisions fixed at their prior
    #[arg(long, default_value_t = false)]
    no_noise: bool,

    /// keep the sparsity precisions fixed at their prior
    #[arg(long, default_value_t = false)]
    no_sparse: bool,

    /// keep the relevance precisions fixed at their prior
    #[arg(long, default_value_t = false)]
    no_ard: bool,

    /// model per-subject voxel mean offsets
    #[arg(long, default_value_t = false)]
    mean_process: bool,

    /// sweep after which the sparsity updates start
    #[arg(long, default_value_t = 25)]
    fixed_sparse: usize,

    /// sweep after which the relevance updates start
    #[arg(long, default_value_t = 30)]
    fixed_ard: usize,

    /// sweep after which the noise updates start
    #[arg(long, default_value_t = 35)]
    fixed_noise: usize,

    /// prior precision of the mean offsets
    #[arg(long, default_value_t = 1.0)]
    beta: f64,

    /// sparsity prior shape a0 in Gamma(a0,b0)
    #[arg(long, default_value_t = 1.0)]
    alpha_a: f64,

    /// sparsity prior rate b0; defaults to a0 * mean(X^2)
    #[arg(long)]
    alpha_b: Option<f64>,

    /// relevance prior shape a0 in Gamma(a0,b0)
    #[arg(long, default_value_t = 1.0)]
    gamma_a: f64,

    /// relevance prior rate b0; defaults to a0 * mean(X^2)
    #[arg(long)]
    gamma_b: Option<f64>,

    /// noise prior shape a0 in Gamma(a0,b0)
    #[arg(long, default_value_t = 1.0)]
    tau_a: f64,

    /// noise prior rate b0; defaults to a0 * mean(X^2)
    #[arg(long)]
    tau_b: Option<f64>,

    /// random seed for the initialization
    #[arg(long)]
    seed: Option<u64>,

    /// run the batched matrix inversions on all cores
    #[arg(long, default_value_t = false)]
    accelerate: bool,

    /// output file prefix
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Run the variational sparse PCA fit over per-subject data files
pub fn run_spca_fit(args: FitArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let mut slices = vec![];
    for file in args.data_files.iter() {
        slices.push(Mat::from_tsv(file, None)?);
    }

    let (vv, tt) = slices
        .first()
        .map(|x| x.dim())
        .ok_or(anyhow::anyhow!("no data files given"))?;

    for (file, x_vt) in args.data_files.iter().zip(slices.iter()) {
        if x_vt.dim() != (vv, tt) {
            return Err(anyhow::anyhow!(
                "{} is {} x {}, expected {} x {}",
                file,
                x_vt.nrows(),
                x_vt.ncols(),
                vv,
                tt
            ));
        }
    }

    let bb = slices.len();
    let mut x_vtb = Stack::zeros((vv, tt, bb));
    for (b, x_vt) in slices.iter().enumerate() {
        x_vtb.index_axis_mut(Axis(2), b).assign(x_vt);
    }

    info!("read {} subjects of {} x {} data", bb, vv, tt);

    let opts = SpcaOptions {
        conv_crit: args.conv_crit,
        maxiter: args.maxiter,
        noise_process: !args.no_noise,
        sparse_prior: !args.no_sparse,
        ard_prior: !args.no_ard,
        mean_process: args.mean_process,
        fixed_sparse: args.fixed_sparse,
        fixed_ard: args.fixed_ard,
        fixed_noise: args.fixed_noise,
        beta: args.beta,
        alpha_a: args.alpha_a,
        alpha_b: args.alpha_b,
        gamma_a: args.gamma_a,
        gamma_b: args.gamma_b,
        tau_a: args.tau_a,
        tau_b: args.tau_b,
        rng_seed: args.seed,
        accelerate: args.accelerate,
        verbose: args.verbose,
    };

    let fit = fit_spca(x_vtb, args.num_components, &opts)?;

    info!("finished after {} sweeps: {:?}", fit.iterations, fit.status);

    write_fit(&fit, &args.out, opts.mean_process)?;

    info!("wrote results under prefix {}", &args.out);
    Ok(())
}

fn write_fit(fit: &SpcaFit, out: &str, with_mean: bool) -> anyhow::Result<()> {
    mkdir(out)?;

    fit.first_moments
        .mixing_vd
        .to_tsv(&format!("{}.mixing.tsv.gz", out))?;

    stack_diagonals(fit.other_moments.mixing_cov_ddv.view())
        .to_tsv(&format!("{}.mixing_var.tsv.gz", out))?;

    let num_subjects = fit.first_moments.sources_dtb.dim().2;
    for b in 0..num_subjects {
        fit.first_moments
            .sources_dtb
            .index_axis(Axis(2), b)
            .to_owned()
            .to_tsv(&format!("{}.sources.s{}.tsv.gz", out, b + 1))?;
    }

    stack_diagonals(fit.other_moments.sources_cov_ddb.view())
        .to_tsv(&format!("{}.sources_var.tsv.gz", out))?;

    if with_mean {
        fit.first_moments
            .mean_vb
            .to_tsv(&format!("{}.mean.tsv.gz", out))?;
        fit.other_moments
            .mean_var_vb
            .to_tsv(&format!("{}.mean_var.tsv.gz", out))?;
    }

    fit.first_moments
        .sparsity_vd
        .to_tsv(&format!("{}.sparsity.tsv.gz", out))?;

    fit.first_moments
        .relevance_d
        .clone()
        .insert_axis(Axis(1))
        .to_tsv(&format!("{}.relevance.tsv.gz", out))?;

    fit.first_moments
        .noise_b
        .clone()
        .insert_axis(Axis(1))
        .to_tsv(&format!("{}.noise.tsv.gz", out))?;

    write_types(&fit.elbo_trace, &format!("{}.elbo.gz", out))?;

    let mut buf = open_buf_writer(&format!("{}.priors.json", out))?;
    buf.write_all(serde_json::to_string_pretty(&fit.priors)?.as_bytes())?;
    buf.write_all(b"\n")?;
    buf.flush()?;

    Ok(())
}

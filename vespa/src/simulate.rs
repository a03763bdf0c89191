#![allow(dead_code)]

use crate::common::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use tensor_util::common_io::mkdir;
use tensor_util::traits::{IoOps, SampleOps};

pub struct SimArgs {
    pub voxels: usize,
    pub times: usize,
    pub subjects: usize,
    pub factors: usize,
    pub density: f64,
    pub noise_sd: f64,
    pub mean_sd: f64,
    pub rseed: u64,
}

pub struct SimOut {
    pub x_vtb: Stack,
    pub mixing_vd: Mat,
    pub sources_dtb: Stack,
    pub mean_vb: Mat,
}

/// Generate a sparse-factor dataset shared across subjects
///
/// ```text
/// X(v,t,b) = sum_d A(v,d) * S(d,t,b) + mu(v,b) + e,  e ~ N(0, noise_sd^2)
/// ```
///
/// The mixing matrix `A` is shared by every subject and sparsified by
/// keeping each entry with probability `density`; the sources are
/// drawn fresh per subject.
pub fn generate_sparse_factor_data(args: &SimArgs) -> anyhow::Result<SimOut> {
    let vv = args.voxels;
    let tt = args.times;
    let bb = args.subjects;
    let dd = args.factors;
    let density = args.density.clamp(0., 1.);

    let mut rng = StdRng::seed_from_u64(args.rseed);

    // 1. sparse shared mixing matrix
    let runif = Uniform::new(0_f64, 1_f64).expect("unif [0, 1)");
    let mut mixing_vd = Mat::rnorm_using(vv, dd, &mut rng);
    mixing_vd.mapv_inplace(|a| {
        if runif.sample(&mut rng) < density {
            a
        } else {
            0.
        }
    });

    // 2. per-subject sources and mean offsets
    let mut sources_dtb = Stack::zeros((dd, tt, bb));
    for b in 0..bb {
        let s_dt = Mat::rnorm_using(dd, tt, &mut rng);
        sources_dtb.index_axis_mut(Axis(2), b).assign(&s_dt);
    }

    let mean_vb = if args.mean_sd > 0. {
        Mat::rnorm_using(vv, bb, &mut rng) * args.mean_sd
    } else {
        Mat::zeros((vv, bb))
    };

    // 3. noisy observations
    let mut x_vtb = Stack::zeros((vv, tt, bb));
    for b in 0..bb {
        let noise_vt = Mat::rnorm_using(vv, tt, &mut rng) * args.noise_sd;
        let x_vt = mixing_vd.dot(&sources_dtb.index_axis(Axis(2), b))
            + &mean_vb.column(b).insert_axis(Axis(1))
            + noise_vt;
        x_vtb.index_axis_mut(Axis(2), b).assign(&x_vt);
    }

    info!(
        "simulated {} x {} x {} tensor from {} factors",
        vv, tt, bb, dd
    );

    Ok(SimOut {
        x_vtb,
        mixing_vd,
        sources_dtb,
        mean_vb,
    })
}

/// Write a simulated dataset as one gzipped tsv per subject along
/// with the generating parameters
/// * `args` - simulation settings
/// * `out` - output file prefix
pub fn generate_sparse_factor_files(args: &SimArgs, out: &str) -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(args)?;

    mkdir(out)?;

    for b in 0..args.subjects {
        let data_file = format!("{}.data.s{}.tsv.gz", out, b + 1);
        sim.x_vtb
            .index_axis(Axis(2), b)
            .to_owned()
            .to_tsv(&data_file)?;

        let source_file = format!("{}.true_sources.s{}.tsv.gz", out, b + 1);
        sim.sources_dtb
            .index_axis(Axis(2), b)
            .to_owned()
            .to_tsv(&source_file)?;
    }

    sim.mixing_vd
        .to_tsv(&format!("{}.true_mixing.tsv.gz", out))?;

    if args.mean_sd > 0. {
        sim.mean_vb.to_tsv(&format!("{}.true_mean.tsv.gz", out))?;
    }

    info!("wrote simulated data files under prefix {}", out);
    Ok(())
}

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use ndarray_linalg::cholesky::{Cholesky, UPLO};

use vespa::fit::fit_spca;
use vespa::options::SpcaOptions;
use vespa::schedule::FitStatus;
use vespa::simulate::{generate_sparse_factor_data, SimArgs};

fn normalized_cross_correlation(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let num = a.dot(&b).abs();
    let den = (a.dot(&a) * b.dot(&b)).sqrt();
    num / den.max(f64::EPSILON)
}

#[test]
fn recovers_planted_mixing_matrix() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 10,
        times: 20,
        subjects: 3,
        factors: 3,
        density: 0.8,
        noise_sd: 0.1,
        mean_sd: 0.0,
        rseed: 42,
    })?;

    let opts = SpcaOptions {
        conv_crit: 1e-6,
        maxiter: 100,
        rng_seed: Some(7),
        ..SpcaOptions::default()
    };

    let fit = fit_spca(sim.x_vtb, 3, &opts)?;
    assert_eq!(fit.status, FitStatus::Converged);

    // every planted component should be matched by a distinct
    // estimated component, up to sign and scale
    let ea_vd = &fit.first_moments.mixing_vd;
    let mut claimed = [false; 3];
    for d_true in 0..3 {
        let truth = sim.mixing_vd.column(d_true);
        let (mut best, mut best_ncc) = (0, 0.0);
        for d in 0..3 {
            let ncc = normalized_cross_correlation(truth, ea_vd.column(d));
            if ncc > best_ncc {
                best = d;
                best_ncc = ncc;
            }
        }
        assert!(
            best_ncc > 0.9,
            "planted component {} best ncc {}",
            d_true,
            best_ncc
        );
        assert!(!claimed[best], "estimated component {} claimed twice", best);
        claimed[best] = true;
    }

    Ok(())
}

#[test]
fn full_rank_component_count_terminates() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 12,
        times: 6,
        subjects: 2,
        factors: 2,
        density: 0.7,
        noise_sd: 0.2,
        mean_sd: 0.0,
        rseed: 11,
    })?;

    // as many components as time points
    let opts = SpcaOptions {
        maxiter: 30,
        rng_seed: Some(5),
        ..SpcaOptions::default()
    };
    let fit = fit_spca(sim.x_vtb, 6, &opts)?;

    assert!(matches!(
        fit.status,
        FitStatus::Converged | FitStatus::MaxIterReached
    ));
    assert!(fit.iterations <= 30);
    assert_eq!(fit.first_moments.mixing_vd.dim(), (12, 6));

    Ok(())
}

#[test]
fn output_shapes_and_covariances() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 15,
        times: 12,
        subjects: 4,
        factors: 3,
        density: 0.6,
        noise_sd: 0.3,
        mean_sd: 0.5,
        rseed: 9,
    })?;

    let opts = SpcaOptions {
        maxiter: 40,
        mean_process: true,
        rng_seed: Some(21),
        ..SpcaOptions::default()
    };
    let fit = fit_spca(sim.x_vtb, 3, &opts)?;

    assert_eq!(fit.first_moments.mixing_vd.dim(), (15, 3));
    assert_eq!(fit.first_moments.sources_dtb.dim(), (3, 12, 4));
    assert_eq!(fit.first_moments.mean_vb.dim(), (15, 4));
    assert_eq!(fit.first_moments.sparsity_vd.dim(), (15, 3));
    assert_eq!(fit.first_moments.relevance_d.len(), 3);
    assert_eq!(fit.first_moments.noise_b.len(), 4);

    assert_eq!(fit.other_moments.mixing_cov_ddv.dim(), (3, 3, 15));
    assert_eq!(fit.other_moments.sources_cov_ddb.dim(), (3, 3, 4));
    assert_eq!(fit.other_moments.mean_var_vb.dim(), (15, 4));
    assert_eq!(fit.other_moments.sparsity_rate_vd.dim(), (15, 3));
    assert_eq!(fit.other_moments.relevance_rate_d.len(), 3);
    assert_eq!(fit.other_moments.noise_rate_b.len(), 4);

    assert_eq!(fit.elbo_trace.len(), fit.iterations);
    assert!(fit.other_moments.mean_var_vb.iter().all(|&s| s > 0.));

    // every covariance slice stays symmetric positive definite
    for v in 0..15 {
        let cov = fit
            .other_moments
            .mixing_cov_ddv
            .index_axis(Axis(2), v)
            .to_owned();
        assert_abs_diff_eq!(cov.clone(), cov.t().to_owned(), epsilon = 1e-10);
        assert!(cov.cholesky(UPLO::Lower).is_ok());
    }
    for b in 0..4 {
        let cov = fit
            .other_moments
            .sources_cov_ddb
            .index_axis(Axis(2), b)
            .to_owned();
        assert_abs_diff_eq!(cov.clone(), cov.t().to_owned(), epsilon = 1e-10);
        assert!(cov.cholesky(UPLO::Lower).is_ok());
    }

    Ok(())
}

#[test]
fn disabled_families_stay_at_their_priors() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 8,
        times: 10,
        subjects: 2,
        factors: 2,
        density: 0.6,
        noise_sd: 0.2,
        mean_sd: 0.0,
        rseed: 3,
    })?;

    let opts = SpcaOptions {
        maxiter: 20,
        noise_process: false,
        sparse_prior: false,
        ard_prior: false,
        rng_seed: Some(13),
        ..SpcaOptions::default()
    };
    let fit = fit_spca(sim.x_vtb, 2, &opts)?;

    assert_eq!(fit.other_moments.sparsity_shape, fit.priors.alpha_a0);
    assert_eq!(fit.other_moments.relevance_shape, fit.priors.gamma_a0);
    assert_eq!(fit.other_moments.noise_shape, fit.priors.tau_a0);

    assert!(fit
        .other_moments
        .sparsity_rate_vd
        .iter()
        .all(|&r| r == fit.priors.alpha_b0));
    assert!(fit
        .other_moments
        .relevance_rate_d
        .iter()
        .all(|&r| r == fit.priors.gamma_b0));
    assert!(fit
        .other_moments
        .noise_rate_b
        .iter()
        .all(|&r| r == fit.priors.tau_b0));

    // mean modeling off: offsets pinned at zero with zero variance
    assert!(fit.first_moments.mean_vb.iter().all(|&m| m == 0.));
    assert!(fit.other_moments.mean_var_vb.iter().all(|&s| s == 0.));

    Ok(())
}

#[test]
fn components_ordered_by_relevance() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 20,
        times: 15,
        subjects: 3,
        factors: 4,
        density: 0.6,
        noise_sd: 0.2,
        mean_sd: 0.0,
        rseed: 17,
    })?;

    let opts = SpcaOptions {
        maxiter: 60,
        fixed_sparse: 5,
        fixed_ard: 8,
        fixed_noise: 10,
        rng_seed: Some(29),
        ..SpcaOptions::default()
    };
    let fit = fit_spca(sim.x_vtb, 4, &opts)?;

    let relevance = &fit.first_moments.relevance_d;
    for d in 1..4 {
        assert!(
            relevance[d] >= relevance[d - 1],
            "relevance out of order at {}",
            d
        );
    }

    // one shared permutation: means and shape/rate pairs stay aligned
    for d in 0..4 {
        assert_abs_diff_eq!(
            relevance[d],
            fit.other_moments.relevance_shape / fit.other_moments.relevance_rate_d[d],
            epsilon = 1e-9
        );
    }
    let shape = fit.other_moments.sparsity_shape;
    for (m, r) in fit
        .first_moments
        .sparsity_vd
        .iter()
        .zip(fit.other_moments.sparsity_rate_vd.iter())
    {
        assert_abs_diff_eq!(*m, shape / *r, epsilon = 1e-9);
    }

    Ok(())
}

#[test]
fn elbo_never_decreases() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 12,
        times: 16,
        subjects: 3,
        factors: 3,
        density: 0.6,
        noise_sd: 0.2,
        mean_sd: 0.0,
        rseed: 23,
    })?;

    let opts = SpcaOptions {
        conv_crit: 1e-12,
        maxiter: 80,
        rng_seed: Some(31),
        ..SpcaOptions::default()
    };
    let fit = fit_spca(sim.x_vtb, 3, &opts)?;

    // each staged family holds its term at zero until it opens, so
    // every sweep is exact coordinate ascent on one fixed objective
    assert_eq!(fit.staging.pushbacks, 0);

    let trace = &fit.elbo_trace;
    assert!(trace.len() >= 2);
    for i in 1..trace.len() {
        let tol = 1e-8 * trace[i - 1].abs().max(1.);
        assert!(
            trace[i] + tol >= trace[i - 1],
            "elbo dropped at sweep {}: {} -> {}",
            i + 1,
            trace[i - 1],
            trace[i]
        );
    }

    Ok(())
}

#[test]
fn mean_offsets_recovered_when_modeled() -> anyhow::Result<()> {
    let sim = generate_sparse_factor_data(&SimArgs {
        voxels: 40,
        times: 30,
        subjects: 3,
        factors: 3,
        density: 0.6,
        noise_sd: 0.1,
        mean_sd: 1.0,
        rseed: 5,
    })?;

    let opts = SpcaOptions {
        conv_crit: 1e-8,
        maxiter: 100,
        mean_process: true,
        rng_seed: Some(3),
        ..SpcaOptions::default()
    };
    let fit = fit_spca(sim.x_vtb, 3, &opts)?;

    for b in 0..3 {
        let ncc = normalized_cross_correlation(
            sim.mean_vb.column(b),
            fit.first_moments.mean_vb.column(b),
        );
        assert!(ncc > 0.8, "subject {} mean ncc {}", b, ncc);
    }

    Ok(())
}

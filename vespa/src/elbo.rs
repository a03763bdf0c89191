use crate::common::*;
use crate::state::PosteriorState;

use tensor_util::stack::stack_diagonals;

/// Evidence lower bound of the current posterior.
///
/// Likelihood plus the Gaussian prior and entropy terms of A, S and
/// mu, plus `-KL(q || prior)` of each enabled Gamma family. A family
/// that has not been updated yet sits exactly at its prior, so its
/// term contributes zero and the bound stays comparable across the
/// staged phases.
pub fn evidence_lower_bound(state: &PosteriorState) -> f64 {
    let vv = state.num_voxels as f64;
    let tt = state.num_times as f64;
    let bb = state.num_subjects as f64;
    let dd = state.num_components as f64;
    let ln_2pi = (2. * std::f64::consts::PI).ln();

    // sum_b T V (<ln tau(b)> - ln 2 pi) / 2 - <tau(b)> err(b) / 2
    let tau_mean = state.tau_b.posterior_mean();
    let tau_log = state.tau_b.posterior_log_mean();
    let mut llik = 0.;
    for b in 0..state.num_subjects {
        llik += 0.5 * tt * vv * (tau_log[b] - ln_2pi) - 0.5 * tau_mean[b] * state.recon_err_b[b];
    }

    // sources against their N(0, 1/gamma) prior; the ln 2 pi parts of
    // the prior and the entropy cancel
    let gamma_mean = state.gamma_d.posterior_mean();
    let gamma_log = state.gamma_d.posterior_log_mean();
    let mut sst_diag_d = DVec::zeros(state.num_components);
    for b in 0..state.num_subjects {
        sst_diag_d += &state.expected_sst(b).diag();
    }
    let sources = 0.5
        * (tt * bb * gamma_log.sum() - gamma_mean.dot(&sst_diag_d)
            + tt * state.ln_det_sigma_s_b.sum())
        + 0.5 * tt * bb * dd;

    // mixing matrix against its N(0, 1/alpha) prior
    let alpha_mean = state.alpha_vd.posterior_mean();
    let alpha_log = state.alpha_vd.posterior_log_mean();
    let ea_sq_vd = state.ea_vd.mapv(|a| a * a);
    let var_vd = stack_diagonals(state.sigma_a_ddv.view());
    let mixing = 0.5
        * (alpha_log.sum() - (alpha_mean * &(ea_sq_vd + var_vd)).sum()
            + state.ln_det_sigma_a_v.sum())
        + 0.5 * vv * dd;

    // mean offsets against N(0, 1/beta0), only when modeled
    let mean_term = if state.config.mean_process {
        let beta0 = state.config.beta0;
        let e2_vb = state.emu_vb.mapv(|m| m * m) + &state.sigma_mu_vb;
        0.5 * (vv * bb * beta0.ln() - beta0 * e2_vb.sum()
            + state.sigma_mu_vb.mapv(|s| s.ln()).sum())
            + 0.5 * vv * bb
    } else {
        0.
    };

    let mut families = 0.;
    if state.config.sparse_prior {
        families += state.alpha_vd.elbo_contribution();
    }
    if state.config.ard_prior {
        families += state.gamma_d.elbo_contribution();
    }
    if state.config.noise_process {
        families += state.tau_b.elbo_contribution();
    }

    llik + sources + mixing + mean_term + families
}

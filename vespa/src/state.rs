use crate::common::*;
use crate::error::SpcaError;
use crate::gamma::{GammaMat, GammaVec};
use crate::options::SpcaOptions;

use ndarray_linalg::least_squares::LeastSquaresSvd;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tensor_util::stack::{Exec, TensorError};
use tensor_util::traits::SampleOps;

/// Modeling switches and resolved hyperparameters, captured once at
/// initialization and immutable for the rest of the run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelConfig {
    pub noise_process: bool,
    pub sparse_prior: bool,
    pub ard_prior: bool,
    pub mean_process: bool,
    pub beta0: f64,
    pub alpha_a0: f64,
    pub alpha_b0: f64,
    pub gamma_a0: f64,
    pub gamma_b0: f64,
    pub tau_a0: f64,
    pub tau_b0: f64,
    pub data_scale: f64,
}

/// Variational posterior for the shared-factorization model
///
/// X[,,b] ~ A * S[,,b] + mu[,b] * 1' + noise(b)
///
/// Trailing letters in field names spell the axes: `ea_vd` is the
/// mixing-matrix mean (voxels x components), `sigma_s_ddb` stacks one
/// source covariance per subject, and so on.
pub struct PosteriorState {
    pub(crate) x_vtb: Stack,

    pub(crate) num_voxels: usize,
    pub(crate) num_times: usize,
    pub(crate) num_subjects: usize,
    pub(crate) num_components: usize,

    ///////////////////////////////
    // mixing matrix  A (shared) //
    ///////////////////////////////
    pub(crate) ea_vd: Mat,
    pub(crate) sigma_a_ddv: Stack,
    pub(crate) ln_det_sigma_a_v: DVec,

    //////////////////////////////
    // sources  S (per subject) //
    //////////////////////////////
    pub(crate) es_dtb: Stack,
    pub(crate) sigma_s_ddb: Stack,
    pub(crate) ln_det_sigma_s_b: DVec,

    ////////////////////////////////////
    // mean offsets mu (per subject)  //
    ////////////////////////////////////
    pub(crate) emu_vb: Mat,
    pub(crate) sigma_mu_vb: Mat,

    ////////////////////////
    // precision families //
    ////////////////////////
    pub(crate) alpha_vd: GammaMat,
    pub(crate) gamma_d: GammaVec,
    pub(crate) tau_b: GammaVec,

    pub(crate) recon_err_b: DVec,

    pub(crate) config: ModelConfig,
    pub(crate) exec: Exec,
}

fn positive(name: &str, x: f64) -> Result<f64, SpcaError> {
    if x.is_finite() && x > 0. {
        Ok(x)
    } else {
        Err(SpcaError::BadHyper(format!("{} = {}", name, x)))
    }
}

impl PosteriorState {
    /// Allocate and randomly initialize the posterior for the data
    /// tensor `x_vtb` (voxels x times x subjects)
    ///
    /// Rate hyperparameters left unset in `opts` are resolved to
    /// `shape * mean(X^2)` so the priors sit at the scale of the data.
    pub fn new(
        x_vtb: Stack,
        num_components: usize,
        opts: &SpcaOptions,
    ) -> Result<Self, SpcaError> {
        let (vv, tt, bb) = x_vtb.dim();
        let dd = num_components;

        if vv == 0 || tt == 0 || bb == 0 {
            return Err(SpcaError::InvalidShape(format!(
                "empty data tensor: {} x {} x {}",
                vv, tt, bb
            )));
        }

        if dd < 1 || dd > tt {
            return Err(SpcaError::InvalidShape(format!(
                "{} components requested with only {} time points",
                dd, tt
            )));
        }

        let beta0 = positive("beta", opts.beta)?;
        let alpha_a0 = positive("alpha_a", opts.alpha_a)?;
        let gamma_a0 = positive("gamma_a", opts.gamma_a)?;
        let tau_a0 = positive("tau_a", opts.tau_a)?;

        let data_scale = x_vtb.mapv(|x| x * x).mean().unwrap_or(0.);
        let data_scale = if data_scale > 0. { data_scale } else { 1. };

        let alpha_b0 = positive("alpha_b", opts.alpha_b.unwrap_or(alpha_a0 * data_scale))?;
        let gamma_b0 = positive("gamma_b", opts.gamma_b.unwrap_or(gamma_a0 * data_scale))?;
        let tau_b0 = positive("tau_b", opts.tau_b.unwrap_or(tau_a0 * data_scale))?;

        let config = ModelConfig {
            noise_process: opts.noise_process,
            sparse_prior: opts.sparse_prior,
            ard_prior: opts.ard_prior,
            mean_process: opts.mean_process,
            beta0,
            alpha_a0,
            alpha_b0,
            gamma_a0,
            gamma_b0,
            tau_a0,
            tau_b0,
            data_scale,
        };

        let mut rng = match opts.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let ea_vd = Mat::rnorm_using(vv, dd, &mut rng);

        // warm-start each subject's sources by regressing the data on
        // the random mixing matrix
        let mut es_dtb = Stack::zeros((dd, tt, bb));
        for b in 0..bb {
            let x_vt = x_vtb.index_axis(Axis(2), b);
            let fit = ea_vd.least_squares(&x_vt).map_err(TensorError::from)?;
            es_dtb.index_axis_mut(Axis(2), b).assign(&fit.solution);
        }

        let eye_dd = Mat::eye(dd);

        let mut sigma_a_ddv = Stack::zeros((dd, dd, vv));
        for v in 0..vv {
            sigma_a_ddv.index_axis_mut(Axis(2), v).assign(&eye_dd);
        }
        let ln_det_sigma_a_v = DVec::zeros(vv);

        let sigma_s_init = &eye_dd * tt as f64;
        let mut sigma_s_ddb = Stack::zeros((dd, dd, bb));
        for b in 0..bb {
            sigma_s_ddb.index_axis_mut(Axis(2), b).assign(&sigma_s_init);
        }
        let ln_det_sigma_s_b = DVec::from_elem(bb, dd as f64 * (tt as f64).ln());

        let (emu_vb, sigma_mu_vb) = if config.mean_process {
            let mut emu = Mat::zeros((vv, bb));
            for b in 0..bb {
                let avg_v = x_vtb
                    .index_axis(Axis(2), b)
                    .mean_axis(Axis(1))
                    .ok_or_else(|| SpcaError::InvalidShape("empty time axis".to_string()))?;
                emu.column_mut(b).assign(&avg_v);
            }
            (emu, Mat::from_elem((vv, bb), 1.))
        } else {
            // fixed at zero with zero variance
            (Mat::zeros((vv, bb)), Mat::zeros((vv, bb)))
        };

        let alpha_vd = GammaMat::new((vv, dd), alpha_a0, alpha_b0);
        let gamma_d = GammaVec::new(dd, gamma_a0, gamma_b0);
        let tau_b = GammaVec::new(bb, tau_a0, tau_b0);

        let exec = if opts.accelerate {
            Exec::Parallel
        } else {
            Exec::Serial
        };

        Ok(Self {
            x_vtb,
            num_voxels: vv,
            num_times: tt,
            num_subjects: bb,
            num_components: dd,
            ea_vd,
            sigma_a_ddv,
            ln_det_sigma_a_v,
            es_dtb,
            sigma_s_ddb,
            ln_det_sigma_s_b,
            emu_vb,
            sigma_mu_vb,
            alpha_vd,
            gamma_d,
            tau_b,
            recon_err_b: DVec::zeros(bb),
            config,
            exec,
        })
    }
}

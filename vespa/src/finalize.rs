use crate::common::*;
use crate::schedule::{FitStatus, StagingReport};
use crate::state::{ModelConfig, PosteriorState};

/// Posterior means after the shared component permutation
pub struct FirstMoments {
    pub mixing_vd: Mat,
    pub sources_dtb: Stack,
    pub mean_vb: Mat,
    pub sparsity_vd: Mat,
    pub relevance_d: DVec,
    pub noise_b: DVec,
}

/// Covariances and Gamma shape/rate pairs, permuted consistently with
/// the first moments
pub struct OtherMoments {
    pub mixing_cov_ddv: Stack,
    pub sources_cov_ddb: Stack,
    pub mean_var_vb: Mat,
    pub sparsity_shape: f64,
    pub sparsity_rate_vd: Mat,
    pub relevance_shape: f64,
    pub relevance_rate_d: DVec,
    pub noise_shape: f64,
    pub noise_rate_b: DVec,
}

pub struct SpcaFit {
    pub first_moments: FirstMoments,
    pub other_moments: OtherMoments,
    pub priors: ModelConfig,
    pub elbo_trace: Vec<f64>,
    pub status: FitStatus,
    pub iterations: usize,
    pub staging: StagingReport,
}

impl PosteriorState {
    // ascending posterior precision, so the broadest components come
    // first; without ARD the mean sparsity precision stands in
    fn component_order(&self) -> Vec<usize> {
        let score: Vec<f64> = if self.config.ard_prior {
            self.gamma_d.posterior_mean().to_vec()
        } else {
            self.alpha_vd
                .posterior_mean()
                .mean_axis(Axis(0))
                .map(|m| m.to_vec())
                .unwrap_or_else(|| vec![0.; self.num_components])
        };

        let mut order: Vec<usize> = (0..self.num_components).collect();
        order.sort_by(|&i, &j| {
            score[i]
                .partial_cmp(&score[j])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }

    /// Apply one shared permutation to every component-indexed array
    /// and package the posterior summaries
    pub(crate) fn finalize(
        self,
        status: FitStatus,
        elbo_trace: Vec<f64>,
        staging: StagingReport,
    ) -> SpcaFit {
        let order = self.component_order();
        let iterations = elbo_trace.len();

        let first_moments = FirstMoments {
            mixing_vd: self.ea_vd.select(Axis(1), &order),
            sources_dtb: self.es_dtb.select(Axis(0), &order),
            mean_vb: self.emu_vb,
            sparsity_vd: self.alpha_vd.posterior_mean().select(Axis(1), &order),
            relevance_d: self.gamma_d.posterior_mean().select(Axis(0), &order),
            noise_b: self.tau_b.posterior_mean().clone(),
        };

        let other_moments = OtherMoments {
            mixing_cov_ddv: self
                .sigma_a_ddv
                .select(Axis(0), &order)
                .select(Axis(1), &order),
            sources_cov_ddb: self
                .sigma_s_ddb
                .select(Axis(0), &order)
                .select(Axis(1), &order),
            mean_var_vb: self.sigma_mu_vb,
            sparsity_shape: self.alpha_vd.shape_value(),
            sparsity_rate_vd: self.alpha_vd.rate().select(Axis(1), &order),
            relevance_shape: self.gamma_d.shape_value(),
            relevance_rate_d: self.gamma_d.rate().select(Axis(0), &order),
            noise_shape: self.tau_b.shape_value(),
            noise_rate_b: self.tau_b.rate().clone(),
        };

        SpcaFit {
            first_moments,
            other_moments,
            priors: self.config,
            elbo_trace,
            status,
            iterations,
            staging,
        }
    }
}

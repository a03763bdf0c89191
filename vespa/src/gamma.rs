use ndarray::prelude::*;
use ndarray::{Dimension, ShapeBuilder};

/// Gamma posterior parameters with precomputed expectations.
///
/// x ~ Gamma(a0, b0) a priori; the variational posterior keeps the
/// conjugate form q(x) = Gamma(a, b) with shape `a_stat` and rate
/// `b_stat`. Expectations are refreshed by `calibrate` after each
/// `update_stat`.
pub struct GammaParam<D: Dimension> {
    //////////////////////
    // hyper parameters //
    //////////////////////
    a0: f64,
    b0: f64,
    ///////////////////////////
    // sufficient statistics //
    ///////////////////////////
    a_stat: Array<f64, D>,
    b_stat: Array<f64, D>,
    //////////////////////////
    // estimated parameters //
    //////////////////////////
    estimated_mean: Array<f64, D>,
    estimated_log_mean: Array<f64, D>,
}

pub type GammaVec = GammaParam<Ix1>;
pub type GammaMat = GammaParam<Ix2>;

impl<D: Dimension> GammaParam<D> {
    /// New parameter array fixed at its prior Gamma(a0, b0)
    ///
    /// # Arguments
    /// * `dim` - dimensions of the parameter array
    /// * `a0` - prior shape
    /// * `b0` - prior rate
    pub fn new<Sh>(dim: Sh, a0: f64, b0: f64) -> Self
    where
        Sh: ShapeBuilder<Dim = D> + Clone,
    {
        let mut param = Self {
            a0,
            b0,
            a_stat: Array::from_elem(dim.clone(), a0),
            b_stat: Array::from_elem(dim.clone(), b0),
            estimated_mean: Array::from_elem(dim.clone(), 0.),
            estimated_log_mean: Array::from_elem(dim, 0.),
        };
        param.calibrate();
        param
    }

    /// Overwrite the sufficient statistics with `prior + data` terms
    ///
    /// * `add_a` - count added to the prior shape, shared by all entries
    /// * `add_b` - entry-wise term added to the prior rate
    pub fn update_stat(&mut self, add_a: f64, add_b: &Array<f64, D>) {
        self.a_stat.fill(self.a0 + add_a);
        self.b_stat = add_b + self.b0;
    }

    /// Refresh `<x>` and `<ln x>` from the current shape and rate
    pub fn calibrate(&mut self) {
        use special::Gamma;
        self.estimated_mean = &self.a_stat / &self.b_stat;
        self.estimated_log_mean =
            &self.a_stat.mapv(|a| Gamma::digamma(a)) - &self.b_stat.mapv(|b| b.ln());
    }

    pub fn posterior_mean(&self) -> &Array<f64, D> {
        &self.estimated_mean
    }

    pub fn posterior_log_mean(&self) -> &Array<f64, D> {
        &self.estimated_log_mean
    }

    pub fn shape(&self) -> &Array<f64, D> {
        &self.a_stat
    }

    pub fn rate(&self) -> &Array<f64, D> {
        &self.b_stat
    }

    /// Posterior shape as a scalar; all entries share it after `update_stat`
    pub fn shape_value(&self) -> f64 {
        self.a_stat.first().copied().unwrap_or(self.a0)
    }

    pub fn hyper(&self) -> (f64, f64) {
        (self.a0, self.b0)
    }

    /// `E[ln prior] + entropy` summed over all entries, so the value is
    /// `-KL(q || prior)` and equals zero when q sits at the prior
    pub fn elbo_contribution(&self) -> f64 {
        use special::Gamma;
        let nn = self.a_stat.len() as f64;

        let prior = nn * (self.a0 * self.b0.ln() - Gamma::ln_gamma(self.a0).0)
            + (self.a0 - 1.) * self.estimated_log_mean.sum()
            - self.b0 * self.estimated_mean.sum();

        let entropy = self
            .a_stat
            .mapv(|a| a + Gamma::ln_gamma(a).0 + (1. - a) * Gamma::digamma(a))
            .sum()
            - self.b_stat.mapv(|b| b.ln()).sum();

        prior + entropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn starts_at_the_prior() {
        let param = GammaMat::new((2, 3), 2.0, 4.0);
        // psi(2) = 1 - euler_gamma
        let psi_two = 1.0 - 0.5772156649015329;
        for &m in param.posterior_mean().iter() {
            assert_abs_diff_eq!(m, 0.5, epsilon = 1e-12);
        }
        for &lm in param.posterior_log_mean().iter() {
            assert_abs_diff_eq!(lm, psi_two - 4_f64.ln(), epsilon = 1e-10);
        }
    }

    #[test]
    fn update_then_calibrate() {
        let mut param = GammaVec::new(3, 1.0, 2.0);
        param.update_stat(0.5, &array![1.0, 2.0, 3.0]);
        param.calibrate();
        assert_abs_diff_eq!(param.posterior_mean()[0], 1.5 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(param.posterior_mean()[2], 1.5 / 5.0, epsilon = 1e-12);
        assert_eq!(param.shape_value(), 1.5);
    }

    #[test]
    fn elbo_peaks_at_the_prior() {
        let prior = GammaVec::new(4, 1.5, 0.5);
        assert_abs_diff_eq!(prior.elbo_contribution(), 0.0, epsilon = 1e-9);

        let mut moved = GammaVec::new(4, 1.5, 0.5);
        moved.update_stat(3.0, &Array1::from_elem(4, 2.0));
        moved.calibrate();
        assert!(moved.elbo_contribution() < 0.0);
    }
}

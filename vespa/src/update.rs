use crate::common::*;
use crate::error::SpcaError;
use crate::schedule::StagingSchedule;
use crate::state::PosteriorState;

use tensor_util::stack::{invert_sym_stack, stack_diagonals};

impl PosteriorState {
    /// One full coordinate ascent sweep in fixed order: sources, mean
    /// offsets, mixing matrix, then the precision families that
    /// `plan` has activated by iteration `iter`.
    pub fn sweep(&mut self, iter: usize, plan: &StagingSchedule) -> Result<(), SpcaError> {
        self.update_sources()?;

        if self.config.mean_process {
            self.update_mean();
        }

        self.update_mixing()?;

        if plan.sparsity_active(iter) {
            self.update_sparsity();
        }

        if plan.relevance_active(iter) {
            self.update_relevance();
        }

        self.refresh_recon_err();

        if plan.noise_active(iter) {
            self.update_noise();
        }

        Ok(())
    }

    /// `<A'A> = EA'EA + sum_v Sigma_A[v]`
    pub(crate) fn expected_ata(&self) -> Mat {
        self.ea_vd.t().dot(&self.ea_vd) + self.sigma_a_ddv.sum_axis(Axis(2))
    }

    /// `<S S'> = ES ES' + T * Sigma_S` for subject `b`
    pub(crate) fn expected_sst(&self, b: usize) -> Mat {
        let es_dt = self.es_dtb.index_axis(Axis(2), b);
        let sigma_dd = self.sigma_s_ddb.index_axis(Axis(2), b);
        es_dt.dot(&es_dt.t()) + &sigma_dd * self.num_times as f64
    }

    // per-subject source columns S(,t,b)
    //
    // Sigma_S[b] = ( <tau(b)> * <A'A> + diag<gamma> )^-1
    // ES[b]      = <tau(b)> * Sigma_S[b] * EA' * (X[b] - Emu[b] * 1')
    fn update_sources(&mut self) -> Result<(), SpcaError> {
        let dd = self.num_components;
        let bb = self.num_subjects;

        let ata_dd = self.expected_ata();
        let tau = self.tau_b.posterior_mean();
        let gamma = self.gamma_d.posterior_mean();

        let mut prec_ddb = Stack::zeros((dd, dd, bb));
        for b in 0..bb {
            let mut prec_dd = prec_ddb.index_axis_mut(Axis(2), b);
            prec_dd.assign(&(&ata_dd * tau[b]));
            let mut diag = prec_dd.diag_mut();
            diag += gamma;
        }

        let (sigma_ddb, ln_det_b) = invert_sym_stack(prec_ddb.view(), self.exec)?;

        for b in 0..bb {
            let x_vt = self.x_vtb.index_axis(Axis(2), b);
            let centered_vt = &x_vt - &self.emu_vb.column(b).insert_axis(Axis(1));
            let sigma_dd = sigma_ddb.index_axis(Axis(2), b);
            let es_dt = sigma_dd.dot(&self.ea_vd.t()).dot(&centered_vt) * tau[b];
            self.es_dtb.index_axis_mut(Axis(2), b).assign(&es_dt);
        }

        self.sigma_s_ddb = sigma_ddb;
        self.ln_det_sigma_s_b = ln_det_b;
        Ok(())
    }

    // per-subject mean offsets mu(,b)
    //
    // Sigma_mu[b] = 1 / ( beta0 + T * <tau(b)> )
    // Emu[b]      = Sigma_mu[b] * <tau(b)> * sum_t (X[b] - EA * ES[b])
    fn update_mean(&mut self) {
        let beta0 = self.config.beta0;
        let tt = self.num_times as f64;
        let tau = self.tau_b.posterior_mean();

        for b in 0..self.num_subjects {
            let x_vt = self.x_vtb.index_axis(Axis(2), b);
            let es_dt = self.es_dtb.index_axis(Axis(2), b);
            let resid_v = (&x_vt - &self.ea_vd.dot(&es_dt)).sum_axis(Axis(1));

            let var = 1. / (beta0 + tt * tau[b]);
            self.sigma_mu_vb.column_mut(b).fill(var);
            self.emu_vb
                .column_mut(b)
                .assign(&(resid_v * (var * tau[b])));
        }
    }

    // shared mixing matrix rows A(v,)
    //
    // Sigma_A[v] = ( sum_b <tau(b)> <S S'>[b] + diag<alpha(v,)> )^-1
    // EA(v,)     = Sigma_A[v] * sum_b <tau(b)> * (X[b] - Emu[b] * 1') * ES[b]'
    fn update_mixing(&mut self) -> Result<(), SpcaError> {
        let dd = self.num_components;
        let vv = self.num_voxels;

        let mut w_dd = Mat::zeros((dd, dd));
        let mut r_vd = Mat::zeros((vv, dd));
        {
            let tau = self.tau_b.posterior_mean();
            for b in 0..self.num_subjects {
                let x_vt = self.x_vtb.index_axis(Axis(2), b);
                let es_dt = self.es_dtb.index_axis(Axis(2), b);
                let centered_vt = &x_vt - &self.emu_vb.column(b).insert_axis(Axis(1));
                w_dd += &(self.expected_sst(b) * tau[b]);
                r_vd += &(centered_vt.dot(&es_dt.t()) * tau[b]);
            }
        }

        let alpha_vd = self.alpha_vd.posterior_mean();
        let mut prec_ddv = Stack::zeros((dd, dd, vv));
        for v in 0..vv {
            let mut prec_dd = prec_ddv.index_axis_mut(Axis(2), v);
            prec_dd.assign(&w_dd);
            let mut diag = prec_dd.diag_mut();
            diag += &alpha_vd.row(v);
        }

        let (sigma_ddv, ln_det_v) = invert_sym_stack(prec_ddv.view(), self.exec)?;

        for v in 0..vv {
            let sigma_dd = sigma_ddv.index_axis(Axis(2), v);
            self.ea_vd.row_mut(v).assign(&sigma_dd.dot(&r_vd.row(v)));
        }

        self.sigma_a_ddv = sigma_ddv;
        self.ln_det_sigma_a_v = ln_det_v;
        Ok(())
    }

    // element-wise sparsity precision alpha(v,d)
    //
    // a0 + 1/2
    // ------------------------------------------
    // b0 + ( EA(v,d)^2 + Sigma_A[d,d,v] ) / 2
    fn update_sparsity(&mut self) {
        let ea_sq_vd = self.ea_vd.mapv(|a| a * a);
        let var_vd = stack_diagonals(self.sigma_a_ddv.view());
        let rate_vd = (ea_sq_vd + var_vd) * 0.5;

        self.alpha_vd.update_stat(0.5, &rate_vd);
        self.alpha_vd.calibrate();
    }

    // per-component relevance precision gamma(d)
    //
    // a0 + T * B / 2
    // -----------------------------
    // b0 + sum_b <S S'>[d,d,b] / 2
    fn update_relevance(&mut self) {
        let mut rate_d = DVec::zeros(self.num_components);
        for b in 0..self.num_subjects {
            let sst_dd = self.expected_sst(b);
            rate_d += &sst_dd.diag();
        }
        rate_d *= 0.5;

        let tb = 0.5 * self.num_times as f64 * self.num_subjects as f64;
        self.gamma_d.update_stat(tb, &rate_d);
        self.gamma_d.calibrate();
    }

    // expected squared residual per subject
    //
    // E|X - A S - mu 1'|^2 = |C|^2 + T * sum_v Sigma_mu
    //                      - 2 tr(C' EA ES) + tr(<A'A> <S S'>)
    // with C = X - Emu 1'
    fn refresh_recon_err(&mut self) {
        let tt = self.num_times as f64;
        let ata_dd = self.expected_ata();

        let mut err_b = DVec::zeros(self.num_subjects);
        for b in 0..self.num_subjects {
            let x_vt = self.x_vtb.index_axis(Axis(2), b);
            let es_dt = self.es_dtb.index_axis(Axis(2), b);
            let centered_vt = &x_vt - &self.emu_vb.column(b).insert_axis(Axis(1));

            let data = centered_vt.mapv(|x| x * x).sum() + tt * self.sigma_mu_vb.column(b).sum();
            let cross = (self.ea_vd.t().dot(&centered_vt) * &es_dt).sum();
            let quad = (&ata_dd * &self.expected_sst(b)).sum();

            err_b[b] = data - 2. * cross + quad;
        }
        self.recon_err_b = err_b;
    }

    // per-subject noise precision tau(b)
    //
    // a0 + T * V / 2
    // ----------------------------
    // b0 + reconstruction-err(b) / 2
    fn update_noise(&mut self) {
        let tv = 0.5 * self.num_times as f64 * self.num_voxels as f64;
        // cancellation can push a tiny residual below zero
        let rate_b = self.recon_err_b.mapv(|e| 0.5 * e.max(0.));

        self.tau_b.update_stat(tv, &rate_b);
        self.tau_b.calibrate();
    }
}

use crate::options::SpcaOptions;

/// Iterations added to every pending activation threshold when the
/// bound decreases
pub const PUSHBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    Running,
    Converged,
    MaxIterReached,
}

/// Where the activation thresholds ended up after a run
#[derive(Debug, Clone, serde::Serialize)]
pub struct StagingReport {
    pub sparse_at: usize,
    pub ard_at: usize,
    pub noise_at: usize,
    pub pushbacks: usize,
    pub last_pushback_iter: Option<usize>,
}

/// Staged activation of the three precision families.
///
/// Each family starts frozen at its prior and turns on only once the
/// sweep counter passes its threshold. A decreasing bound is read as
/// premature activation, so every threshold still in the future gets
/// delayed rather than letting the next family pile on. Thresholds
/// never move earlier and an active family is never switched off.
#[derive(Debug, Clone)]
pub struct StagingSchedule {
    conv_crit: f64,
    maxiter: usize,
    sparse_enabled: bool,
    ard_enabled: bool,
    noise_enabled: bool,
    sparse_at: usize,
    ard_at: usize,
    noise_at: usize,
    pushbacks: usize,
    last_pushback_iter: Option<usize>,
}

impl StagingSchedule {
    pub fn new(opts: &SpcaOptions) -> Self {
        Self {
            conv_crit: opts.conv_crit,
            maxiter: opts.maxiter,
            sparse_enabled: opts.sparse_prior,
            ard_enabled: opts.ard_prior,
            noise_enabled: opts.noise_process,
            sparse_at: opts.fixed_sparse,
            ard_at: opts.fixed_ard,
            noise_at: opts.fixed_noise,
            pushbacks: 0,
            last_pushback_iter: None,
        }
    }

    pub fn sparsity_active(&self, iter: usize) -> bool {
        self.sparse_enabled && iter > self.sparse_at
    }

    pub fn relevance_active(&self, iter: usize) -> bool {
        self.ard_enabled && iter > self.ard_at
    }

    pub fn noise_active(&self, iter: usize) -> bool {
        self.noise_enabled && iter > self.noise_at
    }

    fn all_enabled_active(&self, iter: usize) -> bool {
        (!self.sparse_enabled || iter > self.sparse_at)
            && (!self.ard_enabled || iter > self.ard_at)
            && (!self.noise_enabled || iter > self.noise_at)
    }

    /// Decide what happens after sweep `iter` given the bound so far.
    ///
    /// Convergence needs two things: the relative change must fall
    /// within the tolerance in magnitude, and every enabled family
    /// must already be active, so no sub-model converges before it got
    /// a single update. The iteration cap beats both.
    pub fn assess(&mut self, iter: usize, elbo_trace: &[f64]) -> FitStatus {
        match relative_change(elbo_trace) {
            Some(rel) => {
                if rel < 0. {
                    self.push_back(iter);
                }
                if iter >= self.maxiter {
                    FitStatus::MaxIterReached
                } else if rel.abs() <= self.conv_crit && self.all_enabled_active(iter) {
                    FitStatus::Converged
                } else {
                    FitStatus::Running
                }
            }
            None => {
                if iter >= self.maxiter {
                    FitStatus::MaxIterReached
                } else {
                    FitStatus::Running
                }
            }
        }
    }

    // only thresholds still in the future move; an already active
    // family stays on
    fn push_back(&mut self, iter: usize) {
        let mut moved = false;
        if self.sparse_enabled && self.sparse_at >= iter {
            self.sparse_at += PUSHBACK;
            moved = true;
        }
        if self.ard_enabled && self.ard_at >= iter {
            self.ard_at += PUSHBACK;
            moved = true;
        }
        if self.noise_enabled && self.noise_at >= iter {
            self.noise_at += PUSHBACK;
            moved = true;
        }
        if moved {
            self.pushbacks += 1;
            self.last_pushback_iter = Some(iter);
        }
    }

    pub fn report(&self) -> StagingReport {
        StagingReport {
            sparse_at: self.sparse_at,
            ard_at: self.ard_at,
            noise_at: self.noise_at,
            pushbacks: self.pushbacks,
            last_pushback_iter: self.last_pushback_iter,
        }
    }
}

/// `(ELBO[i] - ELBO[i-1]) / |ELBO[i]|`, or `None` before two sweeps
pub fn relative_change(elbo_trace: &[f64]) -> Option<f64> {
    if elbo_trace.len() < 2 {
        return None;
    }
    let last = elbo_trace[elbo_trace.len() - 1];
    let prev = elbo_trace[elbo_trace.len() - 2];
    Some((last - prev) / last.abs().max(f64::EPSILON))
}

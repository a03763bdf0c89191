use crate::common::*;
use crate::elbo::evidence_lower_bound;
use crate::finalize::SpcaFit;
use crate::options::SpcaOptions;
use crate::schedule::{FitStatus, StagingSchedule};
use crate::state::PosteriorState;

use indicatif::{ProgressBar, ProgressDrawTarget};

/// Fit the multi-subject sparse PCA model by coordinate ascent.
///
/// `x_vtb` is the voxels x times x subjects data tensor and
/// `num_components` the number of shared factors. Sweeps run until the
/// bound settles, with the sparsity, relevance and noise stages opening
/// on the schedule in `opts`.
pub fn fit_spca(
    x_vtb: Stack,
    num_components: usize,
    opts: &SpcaOptions,
) -> anyhow::Result<SpcaFit> {
    let mut state = PosteriorState::new(x_vtb, num_components, opts)?;
    let mut plan = StagingSchedule::new(opts);

    let pb = ProgressBar::new(opts.maxiter as u64);
    if opts.verbose {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let mut elbo_trace = vec![];
    let mut status = FitStatus::Running;

    for iter in 1..=opts.maxiter {
        state.sweep(iter, &plan)?;
        elbo_trace.push(evidence_lower_bound(&state));
        pb.inc(1);

        status = plan.assess(iter, &elbo_trace);

        if opts.verbose && (iter % 10 == 0 || status != FitStatus::Running) {
            info!(
                "[{}] elbo: {}",
                iter,
                elbo_trace.last().ok_or(anyhow::anyhow!("elbo"))?
            );
        }

        if status != FitStatus::Running {
            break;
        }
    }
    pb.finish_and_clear();

    if status == FitStatus::Running {
        // only reachable with maxiter = 0
        status = FitStatus::MaxIterReached;
    }

    let report = plan.report();
    if let Some(last) = report.last_pushback_iter {
        info!(
            "staging pushed back {} time(s), most recently at sweep {}",
            report.pushbacks, last
        );
    }

    Ok(state.finalize(status, elbo_trace, report))
}

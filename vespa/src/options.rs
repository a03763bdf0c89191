/// Options for the variational sparse PCA solver.
#[derive(Debug, Clone)]
pub struct SpcaOptions {
    /// Convergence criterion on the relative ELBO change. Default: 1e-9
    pub conv_crit: f64,
    /// Maximum number of coordinate ascent sweeps. Default: 200
    pub maxiter: usize,
    /// Learn per-subject noise precisions. Default: true
    pub noise_process: bool,
    /// Learn element-wise sparsity precisions on the mixing matrix. Default: true
    pub sparse_prior: bool,
    /// Learn per-component relevance precisions on the sources. Default: true
    pub ard_prior: bool,
    /// Model per-subject voxel mean offsets. Default: false
    pub mean_process: bool,
    /// Sweep after which the sparsity updates start. Default: 25
    pub fixed_sparse: usize,
    /// Sweep after which the relevance updates start. Default: 30
    pub fixed_ard: usize,
    /// Sweep after which the noise updates start. Default: 35
    pub fixed_noise: usize,
    /// Prior precision of the mean offsets. Default: 1.0
    pub beta: f64,
    /// Shape hyperparameter of the sparsity prior. Default: 1.0
    pub alpha_a: f64,
    /// Rate hyperparameter of the sparsity prior. Default: shape * mean(X^2)
    pub alpha_b: Option<f64>,
    /// Shape hyperparameter of the relevance prior. Default: 1.0
    pub gamma_a: f64,
    /// Rate hyperparameter of the relevance prior. Default: shape * mean(X^2)
    pub gamma_b: Option<f64>,
    /// Shape hyperparameter of the noise prior. Default: 1.0
    pub tau_a: f64,
    /// Rate hyperparameter of the noise prior. Default: shape * mean(X^2)
    pub tau_b: Option<f64>,
    /// Random seed for the initial factor matrices. Default: entropy
    pub rng_seed: Option<u64>,
    /// Run the batched matrix inversions on all cores. Default: false
    pub accelerate: bool,
    /// Report progress through the logger instead of a progress bar. Default: false
    pub verbose: bool,
}

impl Default for SpcaOptions {
    fn default() -> Self {
        SpcaOptions {
            conv_crit: 1e-9,
            maxiter: 200,
            noise_process: true,
            sparse_prior: true,
            ard_prior: true,
            mean_process: false,
            fixed_sparse: 25,
            fixed_ard: 30,
            fixed_noise: 35,
            beta: 1.0,
            alpha_a: 1.0,
            alpha_b: None,
            gamma_a: 1.0,
            gamma_b: None,
            tau_a: 1.0,
            tau_b: None,
            rng_seed: None,
            accelerate: false,
            verbose: false,
        }
    }
}

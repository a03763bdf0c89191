use tensor_util::stack::TensorError;

#[derive(thiserror::Error, Debug)]
pub enum SpcaError {
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("hyperparameter out of range: {0}")]
    BadHyper(String),

    #[error(transparent)]
    Degenerate(#[from] TensorError),
}

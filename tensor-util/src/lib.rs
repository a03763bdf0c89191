pub mod common_io; // buffered readers and writers, gzipped or not
pub mod ndarray_io; // delimited text input and output
pub mod ndarray_util; // random matrix sampling
pub mod stack; // batched symmetric matrix routines
pub mod traits;

#![allow(dead_code)]

pub use log::{info, warn};
pub use ndarray::prelude::*;

pub type Mat = Array2<f64>;
pub type Stack = Array3<f64>;
pub type DVec = Array1<f64>;

pub use ndarray::prelude::*;
pub use rand::Rng;
pub use rand_distr::{Distribution, StandardNormal, Uniform};
pub use rayon::prelude::*;

use crate::traits::*;
use num_traits::{Float, FromPrimitive};

impl<T> SampleOps for ndarray::Array2<T>
where
    T: Float + FromPrimitive + Send,
{
    type Mat = Self;
    type Scalar = T;

    fn runif(dd: usize, nn: usize) -> Self::Mat {
        let u01 = Uniform::new(0_f64, 1_f64).expect("unif [0, 1)");

        let rvec: Vec<T> = (0..(dd * nn))
            .into_par_iter()
            .map_init(rand::rng, |rng, _| {
                let x = u01.sample(rng);
                T::from(x).expect("failed to type")
            })
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }

    fn rnorm(dd: usize, nn: usize) -> Self::Mat {
        let rvec: Vec<T> = (0..(dd * nn))
            .into_par_iter()
            .map_init(rand::rng, |rng, _| {
                let x: f64 = rng.sample(StandardNormal);
                T::from(x).expect("failed to type")
            })
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }

    fn rnorm_using<R: Rng>(dd: usize, nn: usize, rng: &mut R) -> Self::Mat {
        let rvec: Vec<T> = (0..(dd * nn))
            .map(|_| {
                let x: f64 = rng.sample(StandardNormal);
                T::from(x).expect("failed to type")
            })
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }

    fn rgamma(dd: usize, nn: usize, param: (f64, f64)) -> Self::Mat {
        let (shape, scale) = param;
        let pdf = rand_distr::Gamma::new(shape, scale).expect("gamma(shape, scale)");

        let rvec: Vec<T> = (0..(dd * nn))
            .into_par_iter()
            .map_init(rand::rng, |rng, _| {
                let x = pdf.sample(rng);
                T::from(x).expect("failed to type")
            })
            .collect();

        Array2::from_shape_vec((dd, nn), rvec).unwrap()
    }
}

use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tensor_util::traits::SampleOps;

#[test]
fn seeded_normal_sampling_is_reproducible() {
    let mut rng1 = StdRng::seed_from_u64(1331);
    let mut rng2 = StdRng::seed_from_u64(1331);
    let x = Array2::<f64>::rnorm_using(17, 11, &mut rng1);
    let y = Array2::<f64>::rnorm_using(17, 11, &mut rng2);
    assert_eq!(x, y);

    let mut rng3 = StdRng::seed_from_u64(1332);
    let z = Array2::<f64>::rnorm_using(17, 11, &mut rng3);
    assert_ne!(x, z);
}

#[test]
fn uniform_samples_stay_in_unit_interval() {
    let x = Array2::<f64>::runif(31, 23);
    assert_eq!(x.dim(), (31, 23));
    assert!(x.iter().all(|&u| (0. ..1.).contains(&u)));
}

#[test]
fn gamma_samples_are_positive() {
    let x = Array2::<f64>::rgamma(19, 13, (2.0, 1.0));
    assert_eq!(x.dim(), (19, 13));
    assert!(x.iter().all(|&g| g > 0.));
}

#[test]
fn normal_samples_have_expected_scale() {
    let x = Array2::<f64>::rnorm(200, 200);
    let mean = x.mean().unwrap_or(f64::NAN);
    let var = x.mapv(|v| v * v).mean().unwrap_or(f64::NAN) - mean * mean;
    assert!(mean.abs() < 0.05);
    assert!((var - 1.).abs() < 0.05);
}

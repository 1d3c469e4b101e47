use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{allocation_error, Result};

/// Reserves exactly `len` elements, reporting allocation failure as an error.
fn try_with_capacity(len: usize) -> Result<Vec<f32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| allocation_error(len, e.to_string()))?;
    Ok(buf)
}

/// Allocates a `Vec<f32>` of `len` zeros.
///
/// # Errors
///
/// Returns [`BenchError::AllocationError`](crate::error::BenchError) if the
/// buffer cannot be reserved.
pub fn try_alloc_zeroed_f32_vec(len: usize) -> Result<Vec<f32>> {
    let mut buf = try_with_capacity(len)?;
    buf.resize(len, 0.0);
    Ok(buf)
}

/// Allocates a `Vec<f32>` of `len` standard normal samples drawn from `rng`.
///
/// Samples are drawn in order, so two calls with identically seeded
/// generators produce identical buffers.
pub fn try_alloc_normal_f32_vec<R: Rng>(len: usize, rng: &mut R) -> Result<Vec<f32>> {
    let mut buf = try_with_capacity(len)?;
    buf.extend((0..len).map(|_| rng.sample::<f32, _>(StandardNormal)));
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zeroed_vec() {
        let v = try_alloc_zeroed_f32_vec(1000).unwrap();
        assert_eq!(v.len(), 1000);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_len() {
        assert!(try_alloc_zeroed_f32_vec(0).unwrap().is_empty());
    }

    #[test]
    fn test_normal_vec_is_reproducible() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let v1 = try_alloc_normal_f32_vec(4096, &mut rng1).unwrap();
        let v2 = try_alloc_normal_f32_vec(4096, &mut rng2).unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_normal_vec_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        let v = try_alloc_normal_f32_vec(100_000, &mut rng).unwrap();
        let mean = v.iter().map(|&x| x as f64).sum::<f64>() / v.len() as f64;
        let var = v.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / v.len() as f64;
        assert!(mean.abs() < 0.02, "mean too far from 0: {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance too far from 1: {var}");
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_capacity_overflow_is_reported() {
        let err = try_alloc_zeroed_f32_vec(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            crate::error::BenchError::AllocationError {
                requested_elements: usize::MAX,
                ..
            }
        ));
    }
}

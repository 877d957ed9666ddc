//! 1D Gaussian kernel

/// Normalized 1D Gaussian kernel.
///
/// The support is truncated at `truncate` standard deviations, with radius
/// `floor(truncate * sigma + 0.5)`, and the weights sum to 1.
///
/// # Arguments
/// * `sigma` - Standard deviation in voxels, must be positive
/// * `truncate` - Support in units of sigma
///
/// # Returns
/// Kernel of length `2 * radius + 1`, centered at index `radius`
pub fn gaussian_kernel_1d(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5).floor() as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }

    kernel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_radius() {
        assert_eq!(gaussian_kernel_1d(1.0, 3.0).len(), 7);
        assert_eq!(gaussian_kernel_1d(1.5, 3.0).len(), 11);
        // 3 * 0.1 + 0.5 < 1: a single tap
        assert_eq!(gaussian_kernel_1d(0.1, 3.0), vec![1.0]);
    }

    #[test]
    fn test_kernel_normalized_and_symmetric() {
        let kernel = gaussian_kernel_1d(2.3, 3.0);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12, "Kernel sum {} should be 1", sum);

        let n = kernel.len();
        for i in 0..n / 2 {
            assert_eq!(kernel[i], kernel[n - 1 - i]);
        }
        let peak = kernel.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(kernel[n / 2], peak);
    }
}

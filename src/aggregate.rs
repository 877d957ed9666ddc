//! Local aggregation of scalar fields
//!
//! Aggregation smooths (Gaussian) or window-sums (sphere) a scalar field
//! with zero padding outside the field, and returns only the values inside
//! an output region. Both aggregators evaluate the region alone instead of
//! the whole field.

use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};

use crate::config::{Mode, Sigma, GAUSSIAN_TRUNCATE};
use crate::error::{LsdError, Result};
use crate::kernels::{gaussian_kernel_1d, sphere_offsets};
use crate::roi::Roi;

/// Local aggregation restricted to an output region.
///
/// `roi` is given in voxel coordinates of `field` and must lie inside it.
pub trait Aggregate {
    fn aggregate(&self, field: ArrayView3<'_, f64>, roi: &Roi) -> Array3<f64>;
}

/// Separable Gaussian smoothing, truncated at 3 standard deviations
#[derive(Debug, Clone)]
pub struct GaussianAggregator {
    kernels: [Vec<f64>; 3],
}

impl GaussianAggregator {
    /// `sigma_voxels` is the per-axis standard deviation in voxels
    pub fn new(sigma_voxels: [f64; 3]) -> Self {
        Self {
            kernels: sigma_voxels.map(|s| gaussian_kernel_1d(s, GAUSSIAN_TRUNCATE)),
        }
    }

    pub fn kernel(&self, axis: usize) -> &[f64] {
        &self.kernels[axis]
    }

    fn convolve(&self, input: ArrayView3<'_, f64>, roi: &Roi, axis: usize) -> Array3<f64> {
        convolve_axis(
            input,
            &self.kernels[axis],
            axis,
            roi.offset[axis] as usize,
            roi.shape[axis],
        )
    }
}

impl Aggregate for GaussianAggregator {
    fn aggregate(&self, field: ArrayView3<'_, f64>, roi: &Roi) -> Array3<f64> {
        // Each pass shrinks one axis to the region, later passes only see
        // what they need.
        let mut current = self.convolve(field, roi, 0);
        for axis in 1..3 {
            current = self.convolve(current.view(), roi, axis);
        }
        current
    }
}

/// Convolve every lane along `axis` with `kernel` (zero padding), keeping
/// `len` outputs starting at `start`.
fn convolve_axis(
    input: ArrayView3<'_, f64>,
    kernel: &[f64],
    axis: usize,
    start: usize,
    len: usize,
) -> Array3<f64> {
    let mut shape = [input.shape()[0], input.shape()[1], input.shape()[2]];
    shape[axis] = len;
    let mut output = Array3::<f64>::zeros(shape);
    let radius = (kernel.len() / 2) as isize;

    Zip::from(output.lanes_mut(Axis(axis)))
        .and(input.lanes(Axis(axis)))
        .for_each(|out, inp| convolve_lane(out, inp, kernel, radius, start));

    output
}

fn convolve_lane(
    mut out: ArrayViewMut1<'_, f64>,
    inp: ArrayView1<'_, f64>,
    kernel: &[f64],
    radius: isize,
    start: usize,
) {
    let n = inp.len() as isize;
    for (i, o) in out.iter_mut().enumerate() {
        let center = (start + i) as isize;
        let mut sum = 0.0;
        for (k, &w) in kernel.iter().enumerate() {
            let src = center + k as isize - radius;
            if src >= 0 && src < n {
                sum += w * inp[src as usize];
            }
        }
        *o = sum;
    }
}

/// Sum over a binary ball centered on each output voxel
#[derive(Debug, Clone)]
pub struct SphereAggregator {
    offsets: Vec<[isize; 3]>,
}

impl SphereAggregator {
    /// Ball of `radius` voxels
    pub fn new(radius: f64) -> Self {
        Self {
            offsets: sphere_offsets(radius),
        }
    }

    /// Number of voxels inside the ball
    pub fn kernel_size(&self) -> usize {
        self.offsets.len()
    }
}

impl Aggregate for SphereAggregator {
    fn aggregate(&self, field: ArrayView3<'_, f64>, roi: &Roi) -> Array3<f64> {
        let (nz, ny, nx) = field.dim();
        let (nz, ny, nx) = (nz as isize, ny as isize, nx as isize);
        let origin = roi.offset.map(|o| o as isize);

        Array3::from_shape_fn((roi.shape[0], roi.shape[1], roi.shape[2]), |(z, y, x)| {
            let cz = origin[0] + z as isize;
            let cy = origin[1] + y as isize;
            let cx = origin[2] + x as isize;
            let mut sum = 0.0;
            for o in &self.offsets {
                let (sz, sy, sx) = (cz + o[0], cy + o[1], cx + o[2]);
                if sz < 0 || sz >= nz || sy < 0 || sy >= ny || sx < 0 || sx >= nx {
                    continue;
                }
                sum += field[[sz as usize, sy as usize, sx as usize]];
            }
            sum
        })
    }
}

/// Aggregator selected by [`Mode`]
#[derive(Debug, Clone)]
pub enum Aggregator {
    Gaussian(GaussianAggregator),
    Sphere(SphereAggregator),
}

impl Aggregator {
    /// Build the aggregator for a physical `sigma` on voxels of `voxel_size`.
    ///
    /// Fails with [`LsdError::AnisotropicSphere`] when `mode` is sphere and
    /// sigma in voxels differs between axes.
    pub fn new(mode: Mode, sigma: &Sigma, voxel_size: [f64; 3]) -> Result<Self> {
        let sigma_voxels = Sigma(sigma.in_voxels(voxel_size));
        match mode {
            Mode::Gaussian => Ok(Aggregator::Gaussian(GaussianAggregator::new(sigma_voxels.0))),
            Mode::Sphere => {
                if !sigma_voxels.is_isotropic() {
                    return Err(LsdError::AnisotropicSphere(sigma_voxels.0));
                }
                Ok(Aggregator::Sphere(SphereAggregator::new(sigma_voxels.0[0])))
            }
        }
    }
}

impl Aggregate for Aggregator {
    fn aggregate(&self, field: ArrayView3<'_, f64>, roi: &Roi) -> Array3<f64> {
        match self {
            Aggregator::Gaussian(g) => g.aggregate(field, roi),
            Aggregator::Sphere(s) => s.aggregate(field, roi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn impulse(n: usize) -> Array3<f64> {
        let mut field = Array3::zeros((n, n, n));
        field[[n / 2, n / 2, n / 2]] = 1.0;
        field
    }

    #[test]
    fn test_gaussian_preserves_constant_interior() {
        let field = Array3::from_elem((15, 15, 15), 2.0);
        let agg = GaussianAggregator::new([1.0; 3]);
        let out = agg.aggregate(field.view(), &Roi::new([5, 5, 5], [5, 5, 5]));
        assert_eq!(out.dim(), (5, 5, 5));
        for &v in out.iter() {
            assert!((v - 2.0).abs() < 1e-12, "Interior value {} should stay 2.0", v);
        }
    }

    #[test]
    fn test_gaussian_zero_padding_at_border() {
        let field = Array3::from_elem((9, 9, 9), 1.0);
        let agg = GaussianAggregator::new([1.0; 3]);
        let out = agg.aggregate(field.view(), &Roi::from_shape([9, 9, 9]));
        // A corner only keeps the center and one side of the kernel on each axis
        let k = agg.kernel(0);
        let one_side: f64 = k[k.len() / 2..].iter().sum();
        assert!((out[[0, 0, 0]] - one_side.powi(3)).abs() < 1e-12);
        assert!(out[[0, 0, 0]] < 0.5, "Corner value {} should be attenuated", out[[0, 0, 0]]);
        assert!((out[[4, 4, 4]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_impulse_response_is_separable_kernel() {
        let field = impulse(11);
        let agg = GaussianAggregator::new([1.0, 0.7, 1.3]);
        let out = agg.aggregate(field.view(), &Roi::from_shape([11, 11, 11]));
        let (kz, ky, kx) = (agg.kernel(0), agg.kernel(1), agg.kernel(2));
        let (rz, ry, rx) = (kz.len() / 2, ky.len() / 2, kx.len() / 2);
        let expected = kz[rz + 1] * ky[ry] * kx[rx - 2];
        assert!((out[[6, 5, 3]] - expected).abs() < 1e-15);
        let total: f64 = out.sum();
        assert!((total - 1.0).abs() < 1e-12, "Impulse mass {} should be preserved", total);
    }

    #[test]
    fn test_gaussian_roi_matches_full_then_crop() {
        let field = Array3::from_shape_fn((10, 11, 12), |(z, y, x)| ((z * 7 + y * 3 + x) % 5) as f64);
        let agg = GaussianAggregator::new([1.2, 0.8, 1.5]);
        let full = agg.aggregate(field.view(), &Roi::from_shape([10, 11, 12]));
        let roi = Roi::new([2, 3, 4], [5, 4, 6]);
        let part = agg.aggregate(field.view(), &roi);
        let cropped = full.slice(s![2..7, 3..7, 4..10]);
        for (a, b) in part.iter().zip(cropped.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sphere_counts_ball_voxels() {
        let field = Array3::from_elem((11, 11, 11), 1.0);
        let agg = SphereAggregator::new(2.0);
        let out = agg.aggregate(field.view(), &Roi::new([5, 5, 5], [1, 1, 1]));
        assert_eq!(out[[0, 0, 0]], agg.kernel_size() as f64);
    }

    #[test]
    fn test_sphere_zero_padding() {
        let field = Array3::from_elem((5, 5, 5), 1.0);
        let agg = SphereAggregator::new(1.0);
        let out = agg.aggregate(field.view(), &Roi::from_shape([5, 5, 5]));
        // Corner: center plus three in-bounds face neighbours
        assert_eq!(out[[0, 0, 0]], 4.0);
        assert_eq!(out[[2, 2, 2]], 7.0);
    }

    #[test]
    fn test_aggregator_rejects_anisotropic_sphere() {
        let result = Aggregator::new(Mode::Sphere, &Sigma([3.0, 3.0, 5.0]), [1.0; 3]);
        assert!(matches!(result, Err(LsdError::AnisotropicSphere(_))));

        let result = Aggregator::new(Mode::Sphere, &Sigma([4.0; 3]), [1.0; 3]);
        assert!(matches!(result, Ok(Aggregator::Sphere(_))));

        let result = Aggregator::new(Mode::Gaussian, &Sigma([3.0, 3.0, 5.0]), [1.0; 3]);
        assert!(matches!(result, Ok(Aggregator::Gaussian(_))));
    }

    #[test]
    fn test_sphere_isotropy_is_judged_in_voxels() {
        // Anisotropic sigma on matching anisotropic voxels is a 2-voxel ball
        let result = Aggregator::new(Mode::Sphere, &Sigma([4.0, 2.0, 2.0]), [2.0, 1.0, 1.0]);
        match result {
            Ok(Aggregator::Sphere(s)) => assert_eq!(s.kernel_size(), sphere_offsets(2.0).len()),
            other => panic!("Expected a sphere aggregator, got {:?}", other),
        }

        // Isotropic physical sigma on anisotropic voxels is not
        let result = Aggregator::new(Mode::Sphere, &Sigma([2.0; 3]), [2.0, 1.0, 1.0]);
        assert_eq!(result.unwrap_err(), LsdError::AnisotropicSphere([1.0, 2.0, 2.0]));
    }
}

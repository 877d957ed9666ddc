//! Per-label local statistics
//!
//! For one binary object mask, computes around every output voxel the local
//! occupancy, the offset from the voxel to the local centroid of the object,
//! and the local coordinate covariance reduced to per-axis variances and
//! pairwise Pearson coefficients.

use ndarray::{s, Array3, Array4, ArrayView3, Axis, Zip};

use crate::aggregate::Aggregate;
use crate::config::{Sigma, NUM_CHANNELS};
use crate::coords::CoordinateGrid;
use crate::roi::Roi;

/// Lower bound applied to variances before they are used as divisors
pub const MIN_VARIANCE: f64 = 1e-3;

/// Covariance entries that are aggregated: the diagonal, then `zy`, `zx`, `yx`
const COVARIANCE_PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];

/// Raw local statistics of one object over an output region
#[derive(Debug, Clone)]
pub struct LocalStatistics {
    /// Local (possibly kernel weighted) occupancy, empty voxels replaced by 1
    pub count: Array3<f64>,
    /// Local centroid minus voxel position, `(3, z, y, x)`
    pub mean_offset: Array4<f64>,
    /// Floored variances divided by `sigma^2`, `(3, z, y, x)`
    pub variance: Array4<f64>,
    /// Pearson coefficients `zy, zx, yx`, `(3, z, y, x)`
    pub pearson: Array4<f64>,
}

impl LocalStatistics {
    /// Stack into the descriptor channel layout:
    /// `[offset(3), variance(3), pearson(3), count]`
    pub fn into_descriptor(self) -> Array4<f64> {
        let (nz, ny, nx) = self.count.dim();
        let mut descriptor = Array4::zeros((NUM_CHANNELS, nz, ny, nx));
        descriptor.slice_mut(s![0..3, .., .., ..]).assign(&self.mean_offset);
        descriptor.slice_mut(s![3..6, .., .., ..]).assign(&self.variance);
        descriptor.slice_mut(s![6..9, .., .., ..]).assign(&self.pearson);
        descriptor.index_axis_mut(Axis(0), 9).assign(&self.count);
        descriptor
    }
}

/// Replace zero counts by 1 so that later divisions are defined.
///
/// Values computed at those voxels are meaningless and are discarded when
/// descriptors are accumulated under the object mask. Returns how many
/// voxels were replaced.
pub fn substitute_empty_counts(count: &mut Array3<f64>) -> usize {
    let mut replaced = 0;
    for c in count.iter_mut() {
        if *c == 0.0 {
            *c = 1.0;
            replaced += 1;
        }
    }
    replaced
}

/// Local statistics of a binary `mask` over `roi`.
///
/// # Arguments
/// * `coords` - Coordinate grid with the same shape as `mask`
/// * `mask` - Binary object mask (0.0 / 1.0)
/// * `aggregator` - Local aggregation kernel
/// * `sigma` - Physical sigma, used to scale variances
/// * `roi` - Output region in voxels of `mask`
pub fn local_statistics<A: Aggregate>(
    coords: &CoordinateGrid,
    mask: ArrayView3<'_, f64>,
    aggregator: &A,
    sigma: &Sigma,
    roi: &Roi,
) -> LocalStatistics {
    let [nz, ny, nx] = roi.shape;

    let mut count = aggregator.aggregate(mask, roi);
    let empty = substitute_empty_counts(&mut count);
    tracing::trace!("{} voxels without object support in ROI", empty);

    let masked_coords: Vec<Array3<f64>> = (0..3)
        .map(|d| &coords.axis(d) * &mask)
        .collect();

    // Local mean position and offset from each voxel to it
    let mut mean = Array4::<f64>::zeros((3, nz, ny, nx));
    let mut mean_offset = Array4::<f64>::zeros((3, nz, ny, nx));
    for d in 0..3 {
        let sum = aggregator.aggregate(masked_coords[d].view(), roi);
        let mean_d = Zip::from(&sum).and(&count).map_collect(|&s, &c| s / c);
        let position = roi.crop(coords.axis(d));
        Zip::from(mean_offset.index_axis_mut(Axis(0), d))
            .and(&mean_d)
            .and(&position)
            .for_each(|o, &m, &p| *o = m - p);
        mean.index_axis_mut(Axis(0), d).assign(&mean_d);
    }

    // cov = E[x x^T] - E[x] E[x]^T on the six independent entries
    let mut covariance = Array4::<f64>::zeros((6, nz, ny, nx));
    for (c, &(i, j)) in COVARIANCE_PAIRS.iter().enumerate() {
        let product = &masked_coords[i] * &masked_coords[j];
        let moment = aggregator.aggregate(product.view(), roi);
        Zip::from(covariance.index_axis_mut(Axis(0), c))
            .and(&moment)
            .and(&count)
            .and(mean.index_axis(Axis(0), i))
            .and(mean.index_axis(Axis(0), j))
            .for_each(|cov, &m, &n, &mi, &mj| *cov = m / n - mi * mj);
    }

    let mut variance = covariance.slice(s![0..3, .., .., ..]).to_owned();
    variance.mapv_inplace(|v| if v < MIN_VARIANCE { MIN_VARIANCE } else { v });

    let mut pearson = covariance.slice(s![3..6, .., .., ..]).to_owned();
    for (p, &(i, j)) in COVARIANCE_PAIRS[3..].iter().enumerate() {
        Zip::from(pearson.index_axis_mut(Axis(0), p))
            .and(variance.index_axis(Axis(0), i))
            .and(variance.index_axis(Axis(0), j))
            .for_each(|r, &vi, &vj| *r /= (vi * vj).sqrt());
    }

    for d in 0..3 {
        let scale = sigma.0[d] * sigma.0[d];
        variance.index_axis_mut(Axis(0), d).mapv_inplace(|v| v / scale);
    }

    LocalStatistics {
        count,
        mean_offset,
        variance,
        pearson,
    }
}

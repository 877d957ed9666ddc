//! Downsampling of label masks and block upsampling of descriptors
//!
//! Statistics can be computed on a strided view of a label mask (stride
//! `df` on every axis) and expanded back afterwards: every fine voxel takes
//! the value of the coarse voxel covering it. There is no interpolation, so
//! results are blocky at object boundaries in exchange for `df^3` less
//! aggregation work.

use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4};

use crate::roi::Roi;

/// Binary mask of `label` sampled at every `df`-th voxel along each axis
pub fn strided_label_mask(segmentation: ArrayView3<'_, u64>, label: u64, df: usize) -> Array3<f64> {
    let step = df as isize;
    segmentation
        .slice(s![..;step, ..;step, ..;step])
        .mapv(|l| if l == label { 1.0 } else { 0.0 })
}

/// Shape of a volume after strided subsampling
pub fn coarse_shape(shape: [usize; 3], df: usize) -> [usize; 3] {
    shape.map(|n| n.div_ceil(df))
}

/// Index of the coarse voxel covering fine voxel `index`
#[inline]
pub fn fine_to_coarse(index: usize, df: usize) -> usize {
    index / df
}

/// Smallest coarse region covering the fine region `roi`.
///
/// `roi` must have a non-negative offset.
pub fn coarse_roi(roi: &Roi, df: usize) -> Roi {
    let df = df as i64;
    let begin = roi.begin().map(|b| b.div_euclid(df));
    let end = roi.end().map(|e| (e + df - 1).div_euclid(df));
    Roi::from_bounds(begin, end)
}

/// Expand a coarse multi-channel block over `coarse` onto the fine region
/// `fine`, replicating each coarse value over its `df^3` block.
///
/// # Arguments
/// * `coarse_values` - Array of shape `(channels, coarse.shape)`
/// * `coarse` - Region covered by `coarse_values`, in coarse voxels
/// * `fine` - Output region in fine voxels, covered by `coarse`
/// * `df` - Downsample factor
pub fn upsample_blocks(
    coarse_values: ArrayView4<'_, f64>,
    coarse: &Roi,
    fine: &Roi,
    df: usize,
) -> Array4<f64> {
    let channels = coarse_values.shape()[0];
    let lift = |axis: usize, local: usize| -> usize {
        let absolute = (fine.offset[axis] as usize) + local;
        fine_to_coarse(absolute, df) - coarse.offset[axis] as usize
    };

    Array4::from_shape_fn(
        (channels, fine.shape[0], fine.shape[1], fine.shape[2]),
        |(c, z, y, x)| coarse_values[[c, lift(0, z), lift(1, y), lift(2, x)]],
    )
}

//! Local shape descriptor computation
//!
//! `LsdEngine` turns a 3D label volume into a 10-channel descriptor over a
//! requested output region:
//! `[offset_z, offset_y, offset_x, var_z, var_y, var_x, pearson_zy, pearson_zx, pearson_yx, count]`.
//!
//! Every label present in the output region is processed on its own (in
//! parallel): its mask is optionally subsampled, local statistics are
//! aggregated around each output voxel, expanded back to full resolution and
//! written to the voxels of that label. The accumulated descriptor is then
//! normalized to `[0, 1]`.
//!
//! The input volume must cover the output region plus [`LsdEngine::context`]
//! for the result to match a computation on an unbounded volume; growing the
//! request and cropping it back is up to the caller (see
//! [`LsdEngine::input_roi`] and [`Roi::crop`]).

use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array4, ArrayView3, ArrayViewD, Axis, Ix3, Zip};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::aggregate::Aggregator;
use crate::config::{LsdParams, VoxelSize, NUM_CHANNELS};
use crate::coords::CoordinateCache;
use crate::error::{LsdError, Result};
use crate::normalize::normalize_descriptor;
use crate::resample::{coarse_roi, coarse_shape, strided_label_mask, upsample_blocks};
use crate::roi::Roi;
use crate::stats::local_statistics;
use crate::utils::mask::{channel_mask, unique_labels};

/// Descriptor and optional foreground mask over the requested region
#[derive(Debug, Clone)]
pub struct LsdOutput {
    /// Shape `(10, z, y, x)`, values in `[0, 1]`
    pub descriptor: Array4<f32>,
    /// Foreground mask replicated over the 10 channels, if requested
    pub mask: Option<Array4<f32>>,
}

/// Local shape descriptor engine
///
/// Holds validated parameters and a (possibly shared) coordinate grid cache.
/// `compute` takes `&self`, so one engine can serve several threads.
#[derive(Debug, Clone)]
pub struct LsdEngine {
    params: LsdParams,
    coords: Arc<CoordinateCache>,
}

impl LsdEngine {
    /// Engine with a private coordinate cache
    pub fn new(params: LsdParams) -> Result<Self> {
        Self::with_cache(params, Arc::new(CoordinateCache::default()))
    }

    /// Engine using an injected coordinate cache
    pub fn with_cache(params: LsdParams, coords: Arc<CoordinateCache>) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, coords })
    }

    pub fn params(&self) -> &LsdParams {
        &self.params
    }

    pub fn cache(&self) -> &Arc<CoordinateCache> {
        &self.coords
    }

    /// Physical context needed around an output region
    pub fn context(&self) -> [f64; 3] {
        self.params.context()
    }

    /// Context rounded up to whole voxels
    pub fn context_voxels(&self, voxel_size: &VoxelSize) -> [usize; 3] {
        voxel_size.voxels_covering(self.context())
    }

    /// Input region needed to compute `output_roi` exactly. The result may
    /// extend outside the available volume; intersect it with the volume
    /// bounds before reading.
    pub fn input_roi(&self, output_roi: &Roi, voxel_size: &VoxelSize) -> Roi {
        let context = self.context_voxels(voxel_size);
        output_roi.grow(context, context)
    }

    /// Compute descriptors for `output_roi` of `segmentation`.
    ///
    /// # Arguments
    /// * `segmentation` - Label volume, must be 3D, label 0 is background
    /// * `voxel_size` - Physical voxel size `(z, y, x)`
    /// * `output_roi` - Output region in voxels of `segmentation`
    ///
    /// # Errors
    /// * [`LsdError::UnsupportedRank`] if `segmentation` is not 3D
    /// * [`LsdError::AnisotropicSphere`] for sphere mode with sigma anisotropic in voxels
    /// * [`LsdError::InvalidVoxelSize`], [`LsdError::RoiOutOfBounds`] for bad geometry
    pub fn compute(
        &self,
        segmentation: ArrayViewD<'_, u64>,
        voxel_size: VoxelSize,
        output_roi: &Roi,
    ) -> Result<LsdOutput> {
        let ndim = segmentation.ndim();
        let segmentation = segmentation
            .into_dimensionality::<Ix3>()
            .map_err(|_| LsdError::UnsupportedRank(ndim))?;
        voxel_size.validate()?;

        let (nz, ny, nx) = segmentation.dim();
        let shape = [nz, ny, nx];
        if !Roi::from_shape(shape).contains(output_roi) {
            return Err(LsdError::RoiOutOfBounds {
                roi: *output_roi,
                shape,
            });
        }

        let params = &self.params;
        let df = params.downsample;
        let sub_voxel_size = voxel_size.coarsen(df);
        let sub_shape = coarse_shape(shape, df);
        let sub_roi = coarse_roi(output_roi, df);
        let aggregator = Aggregator::new(params.mode, &params.sigma, sub_voxel_size.0)?;

        tracing::debug!("Downsampling segmentation with factor {}", df);
        tracing::debug!("Downsampled shape: {:?}", sub_shape);
        tracing::debug!("Downsampled voxel size: {:?}", sub_voxel_size.0);
        tracing::debug!("Sigma in voxels: {:?}", params.sigma.in_voxels(sub_voxel_size.0));

        let coords = self.coords.get_grid(sub_shape, sub_voxel_size.0);

        let roi_labels = output_roi.crop(segmentation);
        let labels = unique_labels(roi_labels);
        tracing::debug!("{} labels in output ROI {}", labels.len(), output_roi);

        let [rz, ry, rx] = output_roi.shape;
        let accumulated = Mutex::new(Array4::<f64>::zeros((NUM_CHANNELS, rz, ry, rx)));

        labels.par_iter().for_each(|&label| {
            tracing::debug!("Creating shape descriptors for label {}", label);
            let start = Instant::now();

            let sub_mask = strided_label_mask(segmentation, label, df);
            let stats = local_statistics(&coords, sub_mask.view(), &aggregator, &params.sigma, &sub_roi);
            let sub_descriptor = stats.into_descriptor();

            let descriptor = if df > 1 {
                upsample_blocks(sub_descriptor.view(), &sub_roi, output_roi, df)
            } else {
                sub_descriptor
            };

            // Label masks are disjoint, so each voxel is written by its own label only
            accumulate_label(&mut accumulated.lock(), &descriptor, roi_labels, label);
            tracing::debug!("Label {} done in {:.2?}", label, start.elapsed());
        });

        let mut descriptor = accumulated.into_inner();
        normalize_descriptor(&mut descriptor, roi_labels, params.mode, &params.sigma);

        let mask = params
            .emit_mask
            .then(|| channel_mask(roi_labels, NUM_CHANNELS));

        Ok(LsdOutput {
            descriptor: descriptor.mapv(|v| v as f32),
            mask,
        })
    }
}

/// Add `descriptor` to `accumulated` on the voxels labelled `label`
fn accumulate_label(
    accumulated: &mut Array4<f64>,
    descriptor: &Array4<f64>,
    labels: ArrayView3<'_, u64>,
    label: u64,
) {
    for (mut acc, part) in accumulated
        .axis_iter_mut(Axis(0))
        .zip(descriptor.axis_iter(Axis(0)))
    {
        Zip::from(&mut acc)
            .and(&part)
            .and(&labels)
            .for_each(|a, &p, &l| {
                if l == label {
                    *a += p;
                }
            });
    }
}

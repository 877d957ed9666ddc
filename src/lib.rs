//! LSD-Core: Local shape descriptors for 3D instance segmentations
//!
//! This crate computes, for every voxel of a label volume, a 10-channel
//! descriptor of the local shape of the object the voxel belongs to: the
//! offset to the local centroid, local variances, pairwise Pearson
//! coefficients and the local occupancy. The descriptors serve as dense
//! auxiliary targets for boundary-aware learning on volumetric data.
//!
//! # Modules
//! - `config`: Parameters (sigma, mode, downsample factor, mask output)
//! - `roi`: Voxel-space regions of interest
//! - `coords`: Physical coordinate grids and their LRU cache
//! - `kernels`: Gaussian and sphere kernels
//! - `aggregate`: Local aggregation of scalar fields
//! - `stats`: Per-label local statistics
//! - `resample`: Mask subsampling and block upsampling
//! - `normalize`: Mapping of descriptor channels onto [0, 1]
//! - `descriptor`: The descriptor engine
//! - `utils`: Label and mask helpers

// Core modules
pub mod config;
pub mod error;
pub mod roi;

// Algorithm modules
pub mod coords;
pub mod kernels;
pub mod aggregate;
pub mod stats;
pub mod resample;
pub mod normalize;
pub mod descriptor;
pub mod utils;

pub use config::{LsdParams, Mode, Sigma, VoxelSize, NUM_CHANNELS};
pub use coords::{CoordinateCache, CoordinateGrid};
pub use descriptor::{LsdEngine, LsdOutput};
pub use error::{LsdError, Result};
pub use roi::Roi;

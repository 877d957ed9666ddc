//! Error types for descriptor computation.

use thiserror::Error;

use crate::roi::Roi;

/// Errors raised by configuration or by a single descriptor computation.
///
/// Every variant is deterministic: it is caused by invalid parameters or
/// input shape, never by transient conditions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LsdError {
    #[error("Unknown mode '{0}', expected 'gaussian' or 'sphere'")]
    UnknownMode(String),

    #[error("Sigma must be positive and finite on every axis, got {0:?}")]
    InvalidSigma([f64; 3]),

    #[error("Downsample factor must be at least 1, got {0}")]
    InvalidDownsample(usize),

    #[error("Mode 'sphere' requires an isotropic sigma in voxels, got {0:?}")]
    AnisotropicSphere([f64; 3]),

    #[error("Local shape descriptors only work on 3D arrays, got {0}D")]
    UnsupportedRank(usize),

    #[error("Voxel size must be positive and finite on every axis, got {0:?}")]
    InvalidVoxelSize([f64; 3]),

    #[error("Output ROI {roi} is not contained in a volume of shape {shape:?}")]
    RoiOutOfBounds { roi: Roi, shape: [usize; 3] },

    #[error("Coordinate cache capacity must be at least 1")]
    InvalidCacheCapacity,
}

pub type Result<T> = std::result::Result<T, LsdError>;

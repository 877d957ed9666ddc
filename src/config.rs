//! Descriptor configuration
//!
//! `LsdParams` is the whole configuration surface: the context `sigma` in
//! physical units, the aggregation `mode`, the statistics `downsample`
//! factor and whether a foreground mask should be produced alongside the
//! descriptor. Parameters are validated once when an engine is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

use crate::error::{LsdError, Result};

/// Number of descriptor channels:
/// `[offset_z, offset_y, offset_x, var_z, var_y, var_x, pearson_zy, pearson_zx, pearson_yx, count]`
pub const NUM_CHANNELS: usize = 10;

/// Ratio between Gaussian context and sigma
pub const GAUSSIAN_TRUNCATE: f64 = 3.0;

/// How local statistics are accumulated around each voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Gaussian-weighted average inside the object
    Gaussian,
    /// Plain sum inside a ball of radius sigma (sigma must be isotropic in voxels)
    Sphere,
}

impl Mode {
    /// Physical padding needed around an output region to compute it exactly
    pub fn context(&self, sigma: &Sigma) -> [f64; 3] {
        match self {
            Mode::Gaussian => sigma.0.map(|s| s * GAUSSIAN_TRUNCATE),
            Mode::Sphere => sigma.0,
        }
    }

    /// Practical upper bound on an observed mean offset, used to map
    /// offsets onto `[0, 1]`.
    ///
    /// The farthest Gaussian context voxel is 3 sigma away but is weighted
    /// down so much that sigma itself is the better bound. Within a sphere a
    /// full-radius offset is only reached degenerately, so half the radius
    /// is used.
    pub fn max_distance(&self, sigma: &Sigma) -> [f64; 3] {
        match self {
            Mode::Gaussian => sigma.0,
            Mode::Sphere => sigma.0.map(|s| 0.5 * s),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for Mode {
    type Err = LsdError;

    fn from_str(s: &str) -> Result<Self> {
        Mode::iter()
            .find(|mode| mode.as_ref() == s)
            .ok_or_else(|| LsdError::UnknownMode(s.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SigmaRepr {
    Scalar(f64),
    Axes([f64; 3]),
}

/// Per-axis context radius in physical units, `(z, y, x)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SigmaRepr")]
pub struct Sigma(pub [f64; 3]);

impl Sigma {
    pub fn is_isotropic(&self) -> bool {
        self.0[0] == self.0[1] && self.0[1] == self.0[2]
    }

    /// Sigma expressed in voxels of the given size
    pub fn in_voxels(&self, voxel_size: [f64; 3]) -> [f64; 3] {
        [
            self.0[0] / voxel_size[0],
            self.0[1] / voxel_size[1],
            self.0[2] / voxel_size[2],
        ]
    }
}

impl From<SigmaRepr> for Sigma {
    fn from(repr: SigmaRepr) -> Self {
        match repr {
            SigmaRepr::Scalar(s) => Sigma([s; 3]),
            SigmaRepr::Axes(axes) => Sigma(axes),
        }
    }
}

impl From<f64> for Sigma {
    fn from(s: f64) -> Self {
        Sigma([s; 3])
    }
}

impl From<[f64; 3]> for Sigma {
    fn from(axes: [f64; 3]) -> Self {
        Sigma(axes)
    }
}

/// Physical size of one voxel, `(z, y, x)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelSize(pub [f64; 3]);

impl VoxelSize {
    pub fn validate(&self) -> Result<()> {
        if self.0.iter().any(|&v| !(v.is_finite() && v > 0.0)) {
            return Err(LsdError::InvalidVoxelSize(self.0));
        }
        Ok(())
    }

    /// Voxel size after keeping every `df`-th voxel
    pub fn coarsen(&self, df: usize) -> VoxelSize {
        VoxelSize(self.0.map(|v| v * df as f64))
    }

    /// Number of whole voxels needed to cover a physical extent on each axis
    pub fn voxels_covering(&self, extent: [f64; 3]) -> [usize; 3] {
        [
            (extent[0] / self.0[0]).ceil() as usize,
            (extent[1] / self.0[1]).ceil() as usize,
            (extent[2] / self.0[2]).ceil() as usize,
        ]
    }
}

impl From<[f64; 3]> for VoxelSize {
    fn from(v: [f64; 3]) -> Self {
        VoxelSize(v)
    }
}

impl From<f64> for VoxelSize {
    fn from(v: f64) -> Self {
        VoxelSize([v; 3])
    }
}

/// Local shape descriptor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LsdParams {
    /// Context in world units: Gaussian standard deviation or sphere radius
    pub sigma: Sigma,
    pub mode: Mode,
    /// Stride used to subsample the label masks before computing statistics
    pub downsample: usize,
    /// Also produce the 10-channel foreground mask
    pub emit_mask: bool,
}

impl Default for LsdParams {
    fn default() -> Self {
        Self {
            sigma: Sigma([5.0; 3]),
            mode: Mode::Gaussian,
            downsample: 1,
            emit_mask: false,
        }
    }
}

impl LsdParams {
    pub fn new(sigma: impl Into<Sigma>, mode: Mode) -> Self {
        Self {
            sigma: sigma.into(),
            mode,
            ..Self::default()
        }
    }

    pub fn with_downsample(mut self, downsample: usize) -> Self {
        self.downsample = downsample;
        self
    }

    pub fn with_mask(mut self, emit_mask: bool) -> Self {
        self.emit_mask = emit_mask;
        self
    }

    /// Setup-time checks. Sphere isotropy is checked per computation.
    pub fn validate(&self) -> Result<()> {
        if self.sigma.0.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(LsdError::InvalidSigma(self.sigma.0));
        }
        if self.downsample == 0 {
            return Err(LsdError::InvalidDownsample(self.downsample));
        }
        Ok(())
    }

    /// Physical context around an output region, see [`Mode::context`]
    pub fn context(&self) -> [f64; 3] {
        self.mode.context(&self.sigma)
    }
}

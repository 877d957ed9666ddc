//! Convolution kernels used to aggregate local statistics
//!
//! - `gaussian`: normalized 1D Gaussian applied separably per axis
//! - `sphere`: binary ball of a radius in voxels

pub mod gaussian;
pub mod sphere;

pub use gaussian::gaussian_kernel_1d;
pub use sphere::sphere_offsets;

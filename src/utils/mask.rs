//! Label and foreground mask utilities
//!
//! Helpers for enumerating object labels, building foreground masks and
//! drawing spherical objects into label volumes.

use std::collections::BTreeSet;

use ndarray::{Array3, Array4, ArrayView3, Axis};

/// Distinct non-zero labels of a volume, in ascending order
pub fn unique_labels(labels: ArrayView3<'_, u64>) -> Vec<u64> {
    let set: BTreeSet<u64> = labels.iter().copied().filter(|&l| l != 0).collect();
    set.into_iter().collect()
}

/// 1.0 where the label is non-zero, 0.0 on background
pub fn foreground_mask(labels: ArrayView3<'_, u64>) -> Array3<f32> {
    labels.mapv(|l| if l != 0 { 1.0 } else { 0.0 })
}

/// Foreground mask replicated over `channels` leading channels
pub fn channel_mask(labels: ArrayView3<'_, u64>, channels: usize) -> Array4<f32> {
    let (nz, ny, nx) = labels.dim();
    let foreground = foreground_mask(labels);
    let mut mask = Array4::zeros((channels, nz, ny, nx));
    for mut channel in mask.axis_iter_mut(Axis(0)) {
        channel.assign(&foreground);
    }
    mask
}

/// Draw a ball of `label` into `volume`
///
/// Voxels within `radius` (in voxels) of `center` are set to `label`,
/// overwriting what was there. Voxel order is `(z, y, x)`.
///
/// # Arguments
/// * `volume` - Label volume to draw into
/// * `center` - Ball center `(z, y, x)` in voxel coordinates
/// * `radius` - Ball radius in voxels
/// * `label` - Label written inside the ball
pub fn draw_sphere(volume: &mut Array3<u64>, center: [f64; 3], radius: f64, label: u64) {
    let r2 = radius * radius;
    for ((z, y, x), v) in volume.indexed_iter_mut() {
        let dz = z as f64 - center[0];
        let dy = y as f64 - center[1];
        let dx = x as f64 - center[2];
        if dz * dz + dy * dy + dx * dx <= r2 {
            *v = label;
        }
    }
}

/// Label volume of the given shape holding a single ball of `label`
pub fn create_sphere_labels(shape: [usize; 3], center: [f64; 3], radius: f64, label: u64) -> Array3<u64> {
    let mut volume = Array3::zeros((shape[0], shape[1], shape[2]));
    draw_sphere(&mut volume, center, radius, label);
    volume
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_labels_basic() {
        let labels = create_sphere_labels([10, 10, 10], [5.0, 5.0, 5.0], 3.0, 7);
        assert_eq!(labels.len(), 1000);

        // Center voxel should be inside
        assert_eq!(labels[[5, 5, 5]], 7);

        // Corner should be outside
        assert_eq!(labels[[0, 0, 0]], 0);

        // Count should be reasonable for a sphere of radius 3
        let count = labels.iter().filter(|&&l| l == 7).count();
        assert!(count > 50 && count < 200, "Sphere voxel count {} seems wrong", count);
    }

    #[test]
    fn test_sphere_labels_zero_radius() {
        let labels = create_sphere_labels([5, 5, 5], [2.0, 2.0, 2.0], 0.0, 1);
        // Only the exact center voxel (distance 0 <= 0)
        assert_eq!(labels.iter().filter(|&&l| l == 1).count(), 1);
    }

    #[test]
    fn test_draw_sphere_overwrites() {
        let mut labels = create_sphere_labels([9, 9, 9], [4.0, 4.0, 4.0], 3.0, 1);
        draw_sphere(&mut labels, [4.0, 4.0, 6.0], 1.0, 2);
        assert_eq!(labels[[4, 4, 6]], 2);
        assert_eq!(labels[[4, 4, 4]], 1);
        assert_eq!(unique_labels(labels.view()), vec![1, 2]);
    }

    #[test]
    fn test_unique_labels_sorted_without_background() {
        let labels = Array3::from_shape_vec((1, 2, 3), vec![5u64, 0, 3, 5, 9, 0]).unwrap();
        assert_eq!(unique_labels(labels.view()), vec![3, 5, 9]);
        let empty = Array3::<u64>::zeros((2, 2, 2));
        assert!(unique_labels(empty.view()).is_empty());
    }

    #[test]
    fn test_channel_mask_replicates_foreground() {
        let labels = Array3::from_shape_vec((1, 1, 3), vec![0u64, 4, 2]).unwrap();
        let mask = channel_mask(labels.view(), 10);
        assert_eq!(mask.shape(), &[10, 1, 1, 3]);
        for c in 0..10 {
            assert_eq!(mask[[c, 0, 0, 0]], 0.0);
            assert_eq!(mask[[c, 0, 0, 1]], 1.0);
            assert_eq!(mask[[c, 0, 0, 2]], 1.0);
        }
    }
}

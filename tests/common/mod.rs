//! Common test utilities for LSD-core integration tests

#![allow(dead_code)]

use ndarray::{Array3, ArrayView4};

use lsd_core::utils::mask::draw_sphere;

/// Mean absolute difference between two descriptors over the given channels,
/// only at voxels where `labels` is non-zero
pub fn mean_abs_diff(
    a: ArrayView4<'_, f32>,
    b: ArrayView4<'_, f32>,
    labels: &Array3<u64>,
    channels: &[usize],
) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for ((z, y, x), &l) in labels.indexed_iter() {
        if l == 0 {
            continue;
        }
        for &c in channels {
            sum += (a[[c, z, y, x]] as f64 - b[[c, z, y, x]] as f64).abs();
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Largest absolute difference between two descriptors
pub fn max_abs_diff(a: ArrayView4<'_, f32>, b: ArrayView4<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64 - y as f64).abs())
        .fold(0.0, f64::max)
}

/// Filled axis-aligned cube of `label` spanning `lo..hi` on every axis
pub fn cube_labels(n: usize, lo: usize, hi: usize, label: u64) -> Array3<u64> {
    Array3::from_shape_fn((n, n, n), |(z, y, x)| {
        let inside = (lo..hi).contains(&z) && (lo..hi).contains(&y) && (lo..hi).contains(&x);
        if inside { label } else { 0 }
    })
}

/// Ball split in two labels at `x = split`, surrounded by 5-voxel blocks of
/// distinct labels
pub fn split_sphere_in_blocks(n: usize, radius: f64, split: usize) -> Array3<u64> {
    let mut labels = Array3::from_shape_fn((n, n, n), |(z, y, x)| {
        let block = (z / 5) * 10_000 + (y / 5) * 100 + x / 5;
        100 + block as u64
    });
    let c = n as f64 / 2.0;
    draw_sphere(&mut labels, [c, c, c], radius, 1);
    for ((_, _, x), l) in labels.indexed_iter_mut() {
        if *l == 1 && x >= split {
            *l = 2;
        }
    }
    labels
}

/// Minimal linear congruential generator for reproducible phantoms
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// Random label volume made of overlapping boxes, with some background left
pub fn random_boxes(shape: [usize; 3], boxes: usize, seed: u64) -> Array3<u64> {
    let mut rng = Lcg::new(seed);
    let mut labels = Array3::<u64>::zeros((shape[0], shape[1], shape[2]));
    for b in 0..boxes {
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for d in 0..3 {
            let n = shape[d] as u64;
            lo[d] = rng.below(n) as usize;
            hi[d] = (lo[d] + 1 + rng.below(n / 2) as usize).min(shape[d]);
        }
        let label = 1 + b as u64 * 3;
        for z in lo[0]..hi[0] {
            for y in lo[1]..hi[1] {
                for x in lo[2]..hi[2] {
                    labels[[z, y, x]] = label;
                }
            }
        }
    }
    labels
}

//! Mapping of raw descriptor channels onto `[0, 1]`

use ndarray::{s, Array4, ArrayView3, Axis, Zip};

use crate::config::{Mode, Sigma};

/// Offset channels
const OFFSET_CHANNELS: [usize; 3] = [0, 1, 2];
/// Pearson channels
const PEARSON_CHANNELS: [usize; 3] = [6, 7, 8];

/// Normalize an accumulated descriptor in place.
///
/// Offsets are scaled by [`Mode::max_distance`] and Pearson coefficients
/// mapped from `[-1, 1]`, both onto `[0, 1]`. Offset and Pearson channels are
/// then zeroed on background voxels (label 0); variance and count channels
/// keep their values there. Finally every channel is clipped to `[0, 1]`.
///
/// # Arguments
/// * `descriptor` - Raw descriptor of shape `(10, z, y, x)`
/// * `labels` - Segmentation restricted to the descriptor region
pub fn normalize_descriptor(
    descriptor: &mut Array4<f64>,
    labels: ArrayView3<'_, u64>,
    mode: Mode,
    sigma: &Sigma,
) {
    let max_distance = mode.max_distance(sigma);

    for (d, &c) in OFFSET_CHANNELS.iter().enumerate() {
        let scale = max_distance[d];
        descriptor
            .index_axis_mut(Axis(0), c)
            .mapv_inplace(|v| v / scale * 0.5 + 0.5);
    }

    descriptor
        .slice_mut(s![6..9, .., .., ..])
        .mapv_inplace(|v| v * 0.5 + 0.5);

    for &c in OFFSET_CHANNELS.iter().chain(PEARSON_CHANNELS.iter()) {
        Zip::from(descriptor.index_axis_mut(Axis(0), c))
            .and(&labels)
            .for_each(|v, &l| {
                if l == 0 {
                    *v = 0.0;
                }
            });
    }

    descriptor.mapv_inplace(|v| v.clamp(0.0, 1.0));
}

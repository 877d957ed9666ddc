//! Binary ball kernel

/// Integer voxel offsets `(dz, dy, dx)` of a ball of `radius` voxels,
/// keeping offsets with `dz^2 + dy^2 + dx^2 <= radius^2`.
pub fn sphere_offsets(radius: f64) -> Vec<[isize; 3]> {
    let r2 = radius * radius;
    let extent = radius.floor() as isize;

    let mut offsets = Vec::new();
    for dz in -extent..=extent {
        for dy in -extent..=extent {
            for dx in -extent..=extent {
                if (dz * dz + dy * dy + dx * dx) as f64 <= r2 {
                    offsets.push([dz, dy, dx]);
                }
            }
        }
    }

    offsets
}

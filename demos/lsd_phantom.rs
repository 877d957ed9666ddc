//! Local shape descriptors on a synthetic multi-object phantom
//!
//! Usage: cargo run --release --example lsd_phantom

use std::time::Instant;

use ndarray::{s, Axis};

use lsd_core::utils::mask::{create_sphere_labels, draw_sphere, unique_labels};
use lsd_core::{LsdEngine, LsdParams, Mode, Roi, Sigma, VoxelSize};

const CHANNEL_NAMES: [&str; 10] = [
    "offset_z", "offset_y", "offset_x",
    "var_z", "var_y", "var_x",
    "pearson_zy", "pearson_zx", "pearson_yx",
    "count",
];

fn main() -> Result<(), String> {
    let total_start = Instant::now();

    // ========================================================================
    // Build phantom
    // ========================================================================
    println!("[INFO] Building phantom...");
    let shape = [48, 64, 64];
    let voxel_size = VoxelSize([2.0, 1.0, 1.0]);

    let mut labels = create_sphere_labels(shape, [24.0, 32.0, 32.0], 12.0, 1);
    draw_sphere(&mut labels, [12.0, 14.0, 14.0], 7.0, 2);
    draw_sphere(&mut labels, [34.0, 48.0, 20.0], 9.0, 3);

    // Slab touching the large sphere
    labels.slice_mut(s![30..36, 40..60, 36..60]).fill(4);

    let ids = unique_labels(labels.view());
    println!("[INFO] Volume: {}x{}x{}, Voxel: {:.1}x{:.1}x{:.1}",
        shape[0], shape[1], shape[2], voxel_size.0[0], voxel_size.0[1], voxel_size.0[2]);
    println!("[INFO] Labels: {:?}", ids);

    // Sphere mode needs sigma isotropic in voxels, here 3 voxels on every axis
    let configs = [
        (Sigma([6.0; 3]), Mode::Gaussian, 1),
        (Sigma([6.0; 3]), Mode::Gaussian, 2),
        (Sigma([6.0, 3.0, 3.0]), Mode::Sphere, 1),
    ];

    for (sigma, mode, downsample) in configs {
        let params = LsdParams::new(sigma, mode).with_downsample(downsample).with_mask(true);
        let engine = LsdEngine::new(params).map_err(|e| e.to_string())?;

        // Central output block, grown by the context for the input
        let output_roi = Roi::new([12, 16, 16], [24, 32, 32]);
        let input_roi = engine
            .input_roi(&output_roi, &voxel_size)
            .intersect(&Roi::from_shape(shape));

        println!("\n[STEP] {:?}", engine.params());
        println!("[INFO] Context: {:?} ({:?} voxels)",
            engine.context(), engine.context_voxels(&voxel_size));
        println!("[INFO] Output ROI: {}", output_roi);
        println!("[INFO] Input ROI: {}", input_roi);

        // Only the input region is handed to the engine
        let input_labels = input_roi.crop(labels.view());
        let local_output_roi = output_roi.shift(input_roi.begin().map(|v| -v));

        let start = Instant::now();
        let out = engine
            .compute(input_labels.into_dyn(), voxel_size, &local_output_roi)
            .map_err(|e| e.to_string())?;
        println!("[INFO] Computed in {:.2?}", start.elapsed());

        let foreground = out
            .mask
            .as_ref()
            .map(|m| m.index_axis(Axis(0), 0).iter().filter(|&&v| v > 0.0).count())
            .unwrap_or(0);
        println!("[INFO] Foreground voxels: {}", foreground);

        for (name, channel) in CHANNEL_NAMES.iter().zip(out.descriptor.axis_iter(Axis(0))) {
            let min = channel.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = channel.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let mean = channel.iter().map(|&v| v as f64).sum::<f64>() / channel.len() as f64;
            println!("[INFO]   {:<11} min={:.3} max={:.3} mean={:.3}", name, min, max, mean);
        }
    }

    println!("\n[INFO] Total time: {:.2?}", total_start.elapsed());
    Ok(())
}

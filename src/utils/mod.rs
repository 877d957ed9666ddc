//! Label volume utilities

pub mod mask;

pub use mask::{channel_mask, create_sphere_labels, draw_sphere, foreground_mask, unique_labels};

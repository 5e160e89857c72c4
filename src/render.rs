//! Lado GPU del heatmap: recursos, el paint callback de egui y la exportación offscreen.
pub mod callback;
pub mod offscreen;
pub mod resources;
pub mod types;
pub mod utils;

pub use callback::{install, paint_heatmap, HeatmapCallback};
pub use offscreen::{headless_device, render_to_bitmap};
pub use resources::HeatmapResources;

pub mod gradient;
pub mod raster;
pub mod resampler;

pub use gradient::{Gradient, RampMode};
pub use raster::{rasterize, MAX_BITMAP_RESOLUTION};
pub use resampler::{SpeedResampler, DEFAULT_MAX_SPEED_PER_SECOND, SPEED_TEXTURE_RESOLUTION};

use crate::funscript::Funscript;
use crate::heatmap::rasterize;
use crate::settings::Settings;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Gpu,
    Cpu,
}

/// Speed buckets for a whole script, using the settings' resolution and max speed.
pub fn script_speeds(script: &Funscript, settings: &Settings) -> Vec<f32> {
    settings
        .resampler()
        .resample(script.duration(), script.actions.as_slice())
}

/// Renders the heatmap without a window. Uses the GPU unless `force_cpu` is set
/// or no adapter is available, in which case the CPU rasterizer draws it.
pub fn render_bitmap_headless(
    speeds: &[f32],
    settings: &Settings,
    width: u32,
    height: u32,
    force_cpu: bool,
) -> (RgbaImage, Backend) {
    let gradient = settings.palette.gradient();
    #[cfg(feature = "wgpu")]
    if !force_cpu {
        match render_bitmap_gpu(speeds, &gradient, settings.resolution, width, height) {
            Ok(img) => return (img, Backend::Gpu),
            Err(e) => log::warn!("GPU export unavailable, using CPU rasterizer: {e:#}"),
        }
    }
    #[cfg(not(feature = "wgpu"))]
    let _ = force_cpu;
    (rasterize(speeds, &gradient, width, height), Backend::Cpu)
}

#[cfg(feature = "wgpu")]
fn render_bitmap_gpu(
    speeds: &[f32],
    gradient: &crate::heatmap::Gradient,
    resolution: usize,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let (device, queue) = crate::render::headless_device()?;
    let mut resources = crate::render::HeatmapResources::new(
        &device,
        &queue,
        wgpu::TextureFormat::Rgba8Unorm,
        gradient,
        resolution,
    );
    resources.update_speeds(&device, &queue, speeds);
    crate::render::render_to_bitmap(&device, &queue, &resources, width, height)
}

pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Resamples `script`, renders the strip and writes it as a PNG.
pub fn export_script(
    script: &Funscript,
    settings: &Settings,
    out: &Path,
    width: u32,
    height: u32,
    force_cpu: bool,
) -> Result<Backend> {
    if script.actions.len() < 2 {
        log::warn!("script has fewer than two actions, the heatmap will be empty");
    }
    let speeds = script_speeds(script, settings);
    let (img, backend) = render_bitmap_headless(&speeds, settings, width, height, force_cpu);
    save_png(&img, out)?;
    log::info!(
        "exported {}x{} heatmap to {} ({:?})",
        img.width(),
        img.height(),
        out.display(),
        backend
    );
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn up_down() -> Funscript {
        Funscript::from_json(r#"{"actions":[{"at":0,"pos":0},{"at":5000,"pos":100},{"at":10000,"pos":0}]}"#)
            .expect("parsed")
    }

    #[test]
    fn speeds_cover_the_script() {
        let settings = Settings {
            resolution: 4,
            max_speed_per_second: 20.0,
            ..Settings::default()
        };
        assert_eq!(script_speeds(&up_down(), &settings), vec![1.0; 4]);
    }

    #[test]
    fn cpu_export_writes_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("heat.png");
        let backend = export_script(&up_down(), &Settings::default(), &out, 64, 8, true).expect("exported");
        assert_eq!(backend, Backend::Cpu);
        let img = image::open(&out).expect("readable").to_rgba8();
        assert_eq!(img.dimensions(), (64, 8));
    }

    #[test]
    fn wide_export_renders_at_full_width() {
        // falls back to the rasterizer when the device cannot hold the target
        let settings = Settings {
            resolution: 4096,
            ..Settings::default()
        };
        let speeds = script_speeds(&up_down(), &settings);
        let (img, _) = render_bitmap_headless(&speeds, &settings, 4096, 4, false);
        assert_eq!(img.dimensions(), (4096, 4));
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let out = Path::new("/nonexistent-dir/heat.png");
        assert!(export_script(&up_down(), &Settings::default(), out, 8, 8, true).is_err());
    }
}

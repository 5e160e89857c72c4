mod app_state;
mod funscript;
mod heatmap;
mod modals;
#[cfg(feature = "wgpu")]
mod render;
mod renderer;
mod settings;
mod timeline;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Stroke speed heatmap viewer for funscript files.
#[derive(Parser, Debug)]
#[command(name = "scriptheat", version, about)]
struct Cli {
    /// Script to open (.funscript)
    script: Option<PathBuf>,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the heatmap to this PNG and exit without opening a window
    #[arg(long)]
    export: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Speed (units/s) mapped to the end of the color ramp
    #[arg(long)]
    max_speed: Option<f32>,

    /// Skip the GPU and rasterize on the CPU
    #[arg(long)]
    cpu: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) if path.exists() => settings::Settings::load(path)?,
        Some(path) => {
            log::info!("{} does not exist yet, using defaults", path.display());
            settings::Settings::default()
        }
        None => settings::Settings::default(),
    };
    if let Some(max_speed) = cli.max_speed {
        settings.max_speed_per_second = max_speed;
    }
    let settings = settings.sanitized();

    if let Some(out) = &cli.export {
        let path = cli
            .script
            .as_ref()
            .context("--export needs a script to render")?;
        let script = funscript::Funscript::load(path)?;
        renderer::export_script(
            &script,
            &settings,
            out,
            cli.width.unwrap_or(settings.export_width),
            cli.height.unwrap_or(settings.export_height),
            cli.cpu,
        )?;
        return Ok(());
    }

    let mut state = app_state::AppState::with_settings(settings, cli.config.clone());
    if let Some(w) = cli.width {
        state.export_width = w;
    }
    if let Some(h) = cli.height {
        state.export_height = h;
    }
    if let Some(path) = &cli.script {
        ui::open_path(&mut state, path);
    }

    let native_options = eframe::NativeOptions {
        renderer: if cli.cpu {
            eframe::Renderer::Glow
        } else {
            eframe::Renderer::Wgpu
        },
        ..Default::default()
    };
    eframe::run_native(
        "scriptheat",
        native_options,
        Box::new(move |cc| Box::new(ui::create_app(cc, state))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

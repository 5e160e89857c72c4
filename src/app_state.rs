use crate::funscript::Funscript;
use crate::heatmap::Gradient;
use crate::settings::Settings;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AppState {
    pub settings: Settings,
    pub settings_path: Option<PathBuf>,

    pub script: Option<Funscript>,
    /// Current speed buckets, shared with the paint callback.
    pub speeds: Arc<Vec<f32>>,
    /// Bumped every time `speeds` changes so the GPU copy can catch up.
    pub speeds_version: u64,

    /// Colors the position graph by stroke speed.
    pub line_gradient: Gradient,
    /// Ramp used by the strip; re-uploaded when `gradient_version` moves.
    pub strip_gradient: Arc<Gradient>,
    pub gradient_version: u64,

    /// Playhead in seconds.
    pub time: f32,
    pub timeline_pan_x: f32,
    pub timeline_zoom: f32,

    pub gpu_available: bool,
    pub cpu_strip_texture: Option<(egui::TextureHandle, u64, u64)>,

    pub show_settings: bool,
    pub settings_draft: Option<Settings>,
    pub show_export_modal: bool,
    pub export_width: u32,
    pub export_height: u32,
    pub export_output_path: Option<PathBuf>,

    pub status: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(Settings::default(), None)
    }
}

impl AppState {
    pub fn with_settings(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self {
            speeds: Arc::new(vec![0.0; settings.resolution]),
            speeds_version: 1,
            line_gradient: Gradient::heat_lines(),
            strip_gradient: Arc::new(settings.palette.gradient()),
            gradient_version: 1,
            time: 0.0,
            timeline_pan_x: 0.0,
            timeline_zoom: 100.0,
            gpu_available: false,
            cpu_strip_texture: None,
            show_settings: false,
            settings_draft: None,
            show_export_modal: false,
            export_width: settings.export_width,
            export_height: settings.export_height,
            export_output_path: None,
            status: None,
            script: None,
            settings_path,
            settings,
        }
    }

    pub fn total_duration(&self) -> f32 {
        self.script.as_ref().map(|s| s.duration()).unwrap_or(0.0)
    }

    pub fn open_script(&mut self, path: &Path) -> Result<()> {
        let script = Funscript::load(path)?;
        self.set_script(script);
        Ok(())
    }

    pub fn set_script(&mut self, script: Funscript) {
        self.status = Some(format!(
            "{}: {} actions, {:.1}s",
            script.title.as_deref().unwrap_or("untitled"),
            script.actions.len(),
            script.duration()
        ));
        self.script = Some(script);
        self.time = 0.0;
        self.timeline_pan_x = 0.0;
        self.refresh_speeds();
    }

    /// Recomputes the speed buckets from the current script and settings.
    pub fn refresh_speeds(&mut self) {
        let speeds = match &self.script {
            Some(script) => crate::renderer::script_speeds(script, &self.settings),
            None => vec![0.0; self.settings.resolution],
        };
        self.speeds = Arc::new(speeds);
        self.speeds_version += 1;
    }

    /// Applies edited settings: resamples and swaps the ramp if the palette changed.
    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        if settings.palette != self.settings.palette {
            self.strip_gradient = Arc::new(settings.palette.gradient());
            self.gradient_version += 1;
        }
        self.settings = settings;
        self.refresh_speeds();
    }

    pub fn save_settings(&mut self) {
        let Some(path) = self.settings_path.clone() else {
            self.status = Some("no settings file given (--config)".to_string());
            return;
        };
        match self.settings.save(&path) {
            Ok(()) => {
                log::info!("saved settings to {}", path.display());
                self.status = Some(format!("settings saved to {}", path.display()));
            }
            Err(e) => {
                log::error!("{e:#}");
                self.status = Some(format!("{e:#}"));
            }
        }
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds.clamp(0.0, self.total_duration());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Palette;

    fn script() -> Funscript {
        Funscript::from_json(r#"{"actions":[{"at":0,"pos":0},{"at":5000,"pos":100},{"at":10000,"pos":0}]}"#)
            .expect("parsed")
    }

    #[test]
    fn set_script_resamples_and_bumps_version() {
        let mut state = AppState::with_settings(
            Settings {
                resolution: 4,
                max_speed_per_second: 20.0,
                ..Settings::default()
            },
            None,
        );
        let before = state.speeds_version;
        state.set_script(script());
        assert!(state.speeds_version > before);
        assert_eq!(*state.speeds, vec![1.0; 4]);
        assert_eq!(state.total_duration(), 10.0);
    }

    #[test]
    fn apply_settings_rescales_and_swaps_palette() {
        let mut state = AppState::with_settings(
            Settings {
                resolution: 4,
                max_speed_per_second: 20.0,
                ..Settings::default()
            },
            None,
        );
        state.set_script(script());
        let gradient_before = state.gradient_version;

        state.apply_settings(Settings {
            resolution: 4,
            max_speed_per_second: 40.0,
            palette: Palette::Lines,
            ..Settings::default()
        });
        assert_eq!(*state.speeds, vec![0.5; 4]);
        assert!(state.gradient_version > gradient_before);
    }

    #[test]
    fn time_is_clamped_to_script() {
        let mut state = AppState::default();
        state.set_script(script());
        state.set_time(25.0);
        assert_eq!(state.time, 10.0);
        state.set_time(-1.0);
        assert_eq!(state.time, 0.0);
    }

    #[test]
    fn empty_state_has_zero_speeds() {
        let state = AppState::default();
        assert_eq!(state.speeds.len(), state.settings.resolution);
        assert!(state.speeds.iter().all(|&v| v == 0.0));
    }
}

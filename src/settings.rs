//! Viewer and export settings, stored as TOML.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use crate::heatmap::{
    Gradient, SpeedResampler, DEFAULT_MAX_SPEED_PER_SECOND, MAX_BITMAP_RESOLUTION,
    SPEED_TEXTURE_RESOLUTION,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    Strip,
    Lines,
}

impl Palette {
    pub fn gradient(self) -> Gradient {
        match self {
            Palette::Strip => Gradient::heat_strip(),
            Palette::Lines => Gradient::heat_lines(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Speed in position units per second that maps to the end of the ramp.
    pub max_speed_per_second: f32,
    /// Number of time buckets in the speed texture.
    pub resolution: usize,
    pub export_width: u32,
    pub export_height: u32,
    pub strip_height: f32,
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_speed_per_second: DEFAULT_MAX_SPEED_PER_SECOND,
            resolution: SPEED_TEXTURE_RESOLUTION,
            export_width: 1024,
            export_height: 64,
            strip_height: 48.0,
            palette: Palette::Strip,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize settings")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("failed to write settings {}", path.display()))
    }

    /// Replaces unusable values with defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.max_speed_per_second > 0.0 && self.max_speed_per_second.is_finite()) {
            log::warn!(
                "max_speed_per_second {} is not usable, falling back to {}",
                self.max_speed_per_second,
                defaults.max_speed_per_second
            );
            self.max_speed_per_second = defaults.max_speed_per_second;
        }
        if self.resolution == 0 {
            self.resolution = defaults.resolution;
        } else if self.resolution > MAX_BITMAP_RESOLUTION as usize {
            log::warn!(
                "resolution {} is above the texture limit, using {}",
                self.resolution,
                MAX_BITMAP_RESOLUTION
            );
            self.resolution = MAX_BITMAP_RESOLUTION as usize;
        }
        if !(self.strip_height > 0.0) {
            self.strip_height = defaults.strip_height;
        }
        self
    }

    pub fn resampler(&self) -> SpeedResampler {
        SpeedResampler::new(self.resolution, self.max_speed_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let s = Settings::default();
        let text = toml::to_string_pretty(&s).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(s, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Settings = toml::from_str("max_speed_per_second = 400.0\npalette = \"lines\"\n").unwrap();
        assert_eq!(parsed.max_speed_per_second, 400.0);
        assert_eq!(parsed.palette, Palette::Lines);
        assert_eq!(parsed.resolution, SPEED_TEXTURE_RESOLUTION);
        assert_eq!(parsed.export_height, 64);
    }

    #[test]
    fn invalid_values_are_sanitized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heat.toml");
        std::fs::write(&path, "max_speed_per_second = -5.0\nresolution = 0\n").unwrap();
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.max_speed_per_second, DEFAULT_MAX_SPEED_PER_SECOND);
        assert_eq!(s.resolution, SPEED_TEXTURE_RESOLUTION);

        let capped = Settings { resolution: 1 << 20, ..Settings::default() }.sanitized();
        assert_eq!(capped.resolution, MAX_BITMAP_RESOLUTION as usize);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("heat.toml");
        let s = Settings {
            export_width: 300,
            ..Settings::default()
        };
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Settings::load(Path::new("/nonexistent/heat.toml")).is_err());
    }
}

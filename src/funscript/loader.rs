use super::action::{Action, FunscriptArray};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct RawAction {
    /// milliseconds
    at: f64,
    pos: f64,
}

#[derive(Deserialize)]
struct RawScript {
    #[serde(default)]
    actions: Vec<RawAction>,
    #[serde(default)]
    inverted: bool,
    #[serde(default)]
    range: Option<f64>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// A motion script loaded from a `.funscript` file.
#[derive(Debug, Clone, Default)]
pub struct Funscript {
    pub actions: FunscriptArray,
    pub title: Option<String>,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

impl Funscript {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut script = Self::from_json(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if script.title.is_none() {
            script.title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string);
        }
        script.path = Some(path.to_path_buf());
        log::info!(
            "loaded {} (version {}, {} actions, {:.1}s)",
            path.display(),
            script.version.as_deref().unwrap_or("?"),
            script.actions.len(),
            script.duration()
        );
        Ok(script)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawScript = serde_json::from_str(text).context("invalid funscript json")?;

        // `range` rescales positions written against a shorter travel
        let range = raw.range.filter(|r| *r > 0.0).unwrap_or(100.0);
        let actions = raw.actions.iter().map(|a| {
            let mut pos = (a.pos * 100.0 / range).clamp(0.0, 100.0);
            if raw.inverted {
                pos = 100.0 - pos;
            }
            Action::new((a.at / 1000.0) as f32, pos as f32)
        });

        let title = raw
            .metadata
            .as_ref()
            .and_then(|m| m.get("title"))
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            actions: FunscriptArray::from_actions(actions),
            title,
            version: raw.version,
            path: None,
        })
    }

    pub fn duration(&self) -> f32 {
        self.actions.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_milliseconds_and_sorts() {
        let src = r#"{"version":"1.0","actions":[{"at":1500,"pos":100},{"at":0,"pos":0},{"at":500,"pos":50}]}"#;
        let script = Funscript::from_json(src).expect("parsed");
        let got: Vec<(f32, f32)> = script.actions.iter().map(|a| (a.at_s, a.pos)).collect();
        assert_eq!(got, vec![(0.0, 0.0), (0.5, 50.0), (1.5, 100.0)]);
        assert_eq!(script.version.as_deref(), Some("1.0"));
        assert_eq!(script.duration(), 1.5);
    }

    #[test]
    fn inverted_and_clamped() {
        let src = r#"{"inverted":true,"actions":[{"at":0,"pos":120},{"at":100,"pos":25}]}"#;
        let script = Funscript::from_json(src).expect("parsed");
        let pos: Vec<f32> = script.actions.iter().map(|a| a.pos).collect();
        assert_eq!(pos, vec![0.0, 75.0]);
    }

    #[test]
    fn range_rescales_positions() {
        let src = r#"{"range":50,"actions":[{"at":0,"pos":25}]}"#;
        let script = Funscript::from_json(src).expect("parsed");
        assert_eq!(script.actions.first().map(|a| a.pos), Some(50.0));
    }

    #[test]
    fn unknown_fields_and_metadata_title() {
        let src = r#"{"actions":[],"metadata":{"title":"warmup","tags":["a"]},"chapters":[]}"#;
        let script = Funscript::from_json(src).expect("parsed");
        assert!(script.actions.is_empty());
        assert_eq!(script.title.as_deref(), Some("warmup"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Funscript::from_json("{\"actions\": [").is_err());
    }

    #[test]
    fn load_uses_file_stem_as_title() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.funscript");
        std::fs::write(&path, r#"{"actions":[{"at":0,"pos":0},{"at":1000,"pos":100}]}"#)
            .expect("write");
        let script = Funscript::load(&path).expect("loaded");
        assert_eq!(script.title.as_deref(), Some("session"));
        assert_eq!(script.actions.len(), 2);
        assert_eq!(script.path.as_deref(), Some(path.as_path()));
    }
}

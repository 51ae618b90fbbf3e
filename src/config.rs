use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "lumatune";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_track_seconds")]
    pub default_track_seconds: u64,
    #[serde(default = "default_restart_threshold_ms")]
    pub restart_threshold_ms: u64,
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("input.txt")
}

fn default_track_seconds() -> u64 {
    180
}

fn default_restart_threshold_ms() -> u64 {
    1_000
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_autoplay() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".logs")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            default_track_seconds: default_track_seconds(),
            restart_threshold_ms: default_restart_threshold_ms(),
            initial_volume: default_initial_volume(),
            autoplay: default_autoplay(),
            log_dir: default_log_dir(),
        }
    }
}

impl Settings {
    /// Duration assumed when the audio backend cannot report one.
    pub fn default_duration(&self) -> Duration {
        Duration::from_secs(self.default_track_seconds.max(1))
    }

    /// Elapsed time after which "previous" restarts the current track.
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_millis(self.restart_threshold_ms)
    }

    pub fn volume(&self) -> f32 {
        if self.initial_volume.is_nan() {
            return default_initial_volume();
        }
        self.initial_volume.clamp(0.0, 1.0)
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("LUMATUNE_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

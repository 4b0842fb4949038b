//! Persisted screen configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use super::types::SectionMask;

const CONFIG_FILE: &str = ".cache/config.json";
const DEFAULT_SLEEP_TIMER_SECONDS: i64 = 30 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enabled sections. Only read when a screen is built.
    pub show_tabs: SectionMask,
    /// Index into the enabled sections, never clamped
    pub last_used_page: usize,
    pub last_sleep_timer_seconds: i64,
    pub text_color: String,
    pub accent_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_tabs: SectionMask::ALL,
            last_used_page: 0,
            last_sleep_timer_seconds: DEFAULT_SLEEP_TIMER_SECONDS,
            text_color: "white".to_string(),
            accent_color: "green".to_string(),
        }
    }
}

impl Config {
    pub fn text_color(&self) -> Color {
        self.text_color.parse().unwrap_or(Color::White)
    }

    pub fn accent_color(&self) -> Color {
        self.accent_color.parse().unwrap_or(Color::Green)
    }
}

/// JSON file holding the [`Config`]
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the live config. A missing file yields the defaults.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("read config {}", self.path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parse config {}", self.path.display()))?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)
            .with_context(|| format!("write config {}", self.path.display()))?;
        Ok(())
    }

    /// Load, modify and save in one step, returning the saved config
    pub fn update(&self, change: impl FnOnce(&mut Config)) -> Result<Config> {
        let mut config = self.load()?;
        change(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(CONFIG_FILE)
    }
}

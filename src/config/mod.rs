// Configuration management for cidtree
// Handles loading/saving settings, with sensible defaults when config is missing

use crate::build::BuildCommand;
use crate::playback::{PlayMode, PlayerCommand};
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub log_dir: PathBuf,
    pub build: BuildConfig,
    pub player: PlayerConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub shell: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub default_mode: PlayMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub status_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("buildtree/tree.json"),
            log_dir: PathBuf::from("logs"),
            build: BuildConfig::default(),
            player: PlayerConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            command: "cd buildtree && ([ -f target/release/buildtree ] && ./target/release/buildtree || cargo run --release)"
                .to_string(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "./play".to_string(),
            args: Vec::new(),
            default_mode: PlayMode::Sequential,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            status_timeout_ms: 3000,
        }
    }
}

impl Config {
    /// Load from `path`, or the per-user location when `None`. A missing
    /// file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    pub fn build_command(&self) -> BuildCommand {
        BuildCommand::new(&self.build.shell, &self.build.command)
    }

    pub fn player_command(&self) -> PlayerCommand {
        PlayerCommand::new(&self.player.program, self.player.args.clone())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_rate_ms.max(10))
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.ui.status_timeout_ms)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("cidtree");

        Ok(config_dir.join("config.toml"))
    }
}

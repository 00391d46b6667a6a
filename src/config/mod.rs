//! Configuration management for the bot.
//!
//! Configuration is TOML, organized into sections mirroring the module
//! layout: `[bot]` identity, `[storage]` persistence paths, `[content]` the
//! message catalog, `[game]` gameplay switches. Every field has a sensible
//! default so a missing section never aborts startup; validation catches the
//! values that would.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Bot identity, mostly for logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,
}

fn default_bot_name() -> String {
    "Blackout Adventure".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
        }
    }
}

/// Where the sled database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "data/game".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Message catalog source. With no path set, the catalog embedded in the
/// binary is used and hot reload is moot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

/// Gameplay switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Cash a fresh player starts with.
    #[serde(default = "default_starting_money")]
    pub starting_money: i64,
    /// Enable the `/give`, `/drop` and `/money` development cheats.
    #[serde(default)]
    pub debug_commands: bool,
    /// Fix the dice seed; unset means seeded from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice_seed: Option<u64>,
}

fn default_starting_money() -> i64 {
    crate::game::types::DEFAULT_STARTING_MONEY
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_money: default_starting_money(),
            debug_commands: false,
            dice_seed: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    /// Load and validate a configuration file.
    pub async fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config file {}", path))?;
        let config: Config =
            toml::from_str(&text).with_context(|| format!("parsing config file {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a starter configuration file with the defaults spelled out.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).context("serializing default config")?;
        fs::write(path, text)
            .await
            .with_context(|| format!("writing config file {}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot.name.trim().is_empty() {
            return Err(anyhow!("bot.name must not be empty"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.game.starting_money < 0 {
            return Err(anyhow!(
                "game.starting_money must not be negative (got {})",
                self.game.starting_money
            ));
        }
        if let Some(path) = &self.content.catalog_path {
            if path.trim().is_empty() {
                return Err(anyhow!("content.catalog_path must not be empty when set"));
            }
        }
        Ok(())
    }
}

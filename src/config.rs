use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::progress;

pub const BACKEND_URL_ENV: &str = "BONICK_BACKEND_URL";

const DEFAULT_BASE_URL: &str =
    "https://vyb2fmcencvxy7saag4ejdedje0yojbh.lambda-url.eu-central-1.on.aws";

fn default_timeout_secs() -> u64 {
    60
}

fn default_greeting() -> String {
    "Hi! I'm Bonick. I'm here to answer your questions about technical issues. \
     Please enter your name and email to start the chat."
        .to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Whole-request timeout. `0` leaves requests unbounded.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub name: String,
    pub greeting: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            name: "Bonick".to_string(),
            greeting: default_greeting(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 448,
            height: 640,
            min_width: 360,
            min_height: 480,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig::default(),
            assistant: AssistantConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Config {
    /// Loads the user config, falling back to defaults on any error, then applies
    /// the `BONICK_BACKEND_URL` override.
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        let mut config = if config_path.exists() {
            match Self::from_file(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    progress::error(format!("{:#}. Using defaults.", e));
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend.base_url = url.trim().to_string();
            }
        }

        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Error parsing {}", path.display()))
    }

    pub fn get_config_path() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/bonick-chat/config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }
}

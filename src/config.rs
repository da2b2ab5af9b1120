//! Configuration management for mastodon-speaker.
//!
//! Instance credentials come from the environment and are required. Everything
//! else (cursor location, speech pipeline, filtering, history) is read from an
//! optional YAML file in standard locations and falls back to defaults.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const INSTANCE_URL_VAR: &str = "MASTODON_INSTANCE_URL";
pub const ACCESS_TOKEN_VAR: &str = "MASTODON_ACCESS_TOKEN";

/// Where to poll and how to authenticate.
#[derive(Clone)]
pub struct InstanceConfig {
    pub url: String,
    pub access_token: String,
}

impl InstanceConfig {
    /// Read `MASTODON_INSTANCE_URL` and `MASTODON_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        Ok(Self {
            url: require(INSTANCE_URL_VAR)?,
            access_token: require(ACCESS_TOKEN_VAR)?,
        })
    }
}

// Keep the bearer token out of logs.
impl fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub path: PathBuf,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("last_notification_id.txt"),
        }
    }
}

/// External synthesizer → player pipeline. Piper emits raw 16 kHz S16_LE mono.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub synthesizer: String,
    pub synthesizer_args: Vec<String>,
    pub player: String,
    pub player_args: Vec<String>,
    /// Silence between consecutive announcements.
    pub pause_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            synthesizer: "piper".into(),
            synthesizer_args: vec![
                "--model".into(),
                "en_US-danny-low.onnx".into(),
                "--output-raw".into(),
            ],
            player: "aplay".into(),
            player_args: vec![
                "-r".into(),
                "16000".into(),
                "-f".into(),
                "S16_LE".into(),
                "-t".into(),
                "raw".into(),
                "-".into(),
            ],
            pause_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnnounceConfig {
    /// Notification types (as the API names them) that are never spoken.
    pub exclude_types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Defaults to ~/.mastodon-speaker-history when unset.
    pub dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cursor: CursorConfig,
    pub speech: SpeechConfig,
    pub announce: AnnounceConfig,
    pub history: HistoryConfig,
}

impl Config {
    /// Load configuration from YAML file, or `default_location()` when no path is given.
    /// A missing or broken file means defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(config_path) = path.map(PathBuf::from).or_else(Self::default_location) else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        let loaded = std::fs::read_to_string(&config_path)
            .map_err(|e| e.to_string())
            .and_then(|contents| Self::parse(&contents).map_err(|e| e.to_string()));

        match loaded {
            Ok(config) => {
                info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring {}: {e}", config_path.display());
                Self::default()
            }
        }
    }

    /// First existing of ./config.yaml, ~/.config/mastodon-speaker/config.yaml,
    /// /etc/mastodon-speaker/config.yaml.
    fn default_location() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok().map(|d| d.join("config.yaml"));
        let user = dirs::config_dir().map(|d| d.join("mastodon-speaker").join("config.yaml"));
        let system = Some(PathBuf::from("/etc/mastodon-speaker/config.yaml"));

        [cwd, user, system].into_iter().flatten().find(|p| p.is_file())
    }

    fn parse(contents: &str) -> std::result::Result<Self, serde_yml::Error> {
        // An empty file deserializes to unit, not to an empty mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents)
    }
}
